//! Application struct that encapsulates server assembly and serving logic.

use crate::cli::RunArgs;
use batchgate_batch::import::{ImportProductJob, ProductStore};
use batchgate_batch::{JobRepository, TaskJobLauncher};
use batchgate_core::config::Config;
use batchgate_core::lifecycle::signal::SignalHandler;
use batchgate_core::lifecycle::{self, Lifecycle};
use std::sync::Arc;
use std::time::Duration;

/// Fall back to defaults when the config file cannot be loaded, then apply
/// CLI overrides.
pub fn resolve_config(args: &RunArgs, loaded: anyhow::Result<Config>) -> Config {
    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to load config from '{}': {e}, using defaults",
            args.config
        );
        Config::default()
    });

    if let Some(ref host) = args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(timeout) = args.shutdown_timeout {
        config.shutdown_timeout = timeout;
    }
    config
}

pub struct Application {
    config: Config,
    app_router: axum::Router,
    launcher: Arc<TaskJobLauncher>,
    lifecycle: Box<dyn Lifecycle>,
}

impl Application {
    /// Build the job repository, launcher, import job and router.
    pub fn build(config: Config) -> anyhow::Result<Self> {
        let repository = Arc::new(JobRepository::new(config.launcher.history_capacity));
        let launcher = Arc::new(TaskJobLauncher::new(repository.clone()));
        let products = Arc::new(ProductStore::new());
        let import_product_job = Arc::new(ImportProductJob::new(
            &config.import.input,
            config.import.skip_limit,
            products.clone(),
        ));

        tracing::info!(
            input = %config.import.input,
            skip_limit = config.import.skip_limit,
            history_capacity = config.launcher.history_capacity,
            "Import product job configured"
        );

        let state = batchgate_server::AppState {
            launcher: launcher.clone(),
            import_product_job,
            repository,
            products,
            body_limit_bytes: config.body_limit_bytes(),
        };
        let app_router = batchgate_server::build_router(state);

        Ok(Self {
            config,
            app_router,
            launcher,
            lifecycle: lifecycle::detect_lifecycle(),
        })
    }

    /// Serve HTTP until a shutdown signal arrives, then drain.
    pub async fn serve(self) -> anyhow::Result<()> {
        let Self {
            config,
            app_router,
            launcher,
            lifecycle,
        } = self;

        let (signal_handler, mut shutdown_rx) = SignalHandler::new();
        let closing = launcher.clone();
        tokio::spawn(signal_handler.on_shutdown(move || closing.close()).run());

        let addr = config.listen_addr();
        tracing::info!("Starting HTTP server on {addr}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        lifecycle.on_ready(&addr);

        axum::serve(listener, app_router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|v| *v).await;
            })
            .await?;

        lifecycle.on_draining(launcher.running_jobs());
        let abandoned = drain(&launcher, Duration::from_secs(config.shutdown_timeout)).await;
        lifecycle.on_stopped(abandoned);

        tracing::info!("Server shut down.");
        Ok(())
    }
}

/// Wait for running jobs to finish, up to `timeout`. Returns how many were
/// still running when the wait ended.
async fn drain(launcher: &TaskJobLauncher, timeout: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let running = launcher.running_jobs();
        if running == 0 || tokio::time::Instant::now() >= deadline {
            return running;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
