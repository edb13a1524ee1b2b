//! Shutdown signal handling (SIGTERM/SIGINT).

use tokio::sync::watch;

type ShutdownHook = Box<dyn FnOnce() + Send>;

/// Waits for an OS signal, runs the registered shutdown hooks, then flips a
/// watch channel so the HTTP server stops.
///
/// Hooks run before the channel flips: a launcher closed from a hook rejects
/// triggers that arrive while in-flight requests are still being served.
pub struct SignalHandler {
    shutdown_tx: watch::Sender<bool>,
    hooks: Vec<ShutdownHook>,
}

impl SignalHandler {
    /// Create a handler and a receiver that becomes `true` on shutdown.
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                shutdown_tx: tx,
                hooks: Vec::new(),
            },
            rx,
        )
    }

    /// Register a hook to run once when shutdown begins.
    pub fn on_shutdown(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Wait for SIGTERM, SIGINT or Ctrl+C, then shut down.
    pub async fn run(self) {
        let signal = wait_for_signal().await;
        tracing::info!("Received {signal}, closing launcher and shutting down...");
        self.shutdown();
    }

    /// Run the hooks and signal shutdown without waiting for an OS signal.
    pub fn shutdown(self) {
        for hook in self.hooks {
            hook();
        }
        let _ = self.shutdown_tx.send(true);
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            }
        }
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl+C"
}
