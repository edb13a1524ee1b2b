//! Process lifecycle of the job service: readiness, drain reporting, signal
//! handling and logging.

pub mod logging;
pub mod signal;

use sd_notify::NotifyState;

/// Hooks around the window in which the service accepts job triggers.
pub trait Lifecycle: Send + Sync {
    /// The listener is bound on `addr`.
    fn on_ready(&self, addr: &str);
    /// The launcher is closed and `running_jobs` executions are draining.
    fn on_draining(&self, running_jobs: usize);
    /// Draining ended with `abandoned_jobs` executions still running.
    fn on_stopped(&self, abandoned_jobs: usize);
}

/// Reports lifecycle events to the log only.
pub struct ConsoleLifecycle;

impl Lifecycle for ConsoleLifecycle {
    fn on_ready(&self, addr: &str) {
        tracing::info!(addr, "Accepting job triggers");
    }

    fn on_draining(&self, running_jobs: usize) {
        tracing::info!(running_jobs, "Launcher closed, draining jobs");
    }

    fn on_stopped(&self, abandoned_jobs: usize) {
        if abandoned_jobs > 0 {
            tracing::warn!(abandoned_jobs, "Stopped with jobs still running");
        } else {
            tracing::info!("All jobs drained");
        }
    }
}

/// Reports lifecycle events to systemd as well as the log. The `STATUS=`
/// line carries the listen address and the number of jobs left.
pub struct SystemdLifecycle;

impl SystemdLifecycle {
    fn notify(states: &[NotifyState<'_>]) {
        // Keep NOTIFY_SOCKET set; later events notify again
        if let Err(e) = sd_notify::notify(false, states) {
            tracing::debug!("sd-notify failed: {e}");
        }
    }
}

impl Lifecycle for SystemdLifecycle {
    fn on_ready(&self, addr: &str) {
        let status = ready_status(addr);
        Self::notify(&[NotifyState::Ready, NotifyState::Status(&status)]);
        ConsoleLifecycle.on_ready(addr);
    }

    fn on_draining(&self, running_jobs: usize) {
        let status = draining_status(running_jobs);
        Self::notify(&[NotifyState::Stopping, NotifyState::Status(&status)]);
        ConsoleLifecycle.on_draining(running_jobs);
    }

    fn on_stopped(&self, abandoned_jobs: usize) {
        let status = stopped_status(abandoned_jobs);
        Self::notify(&[NotifyState::Status(&status)]);
        ConsoleLifecycle.on_stopped(abandoned_jobs);
    }
}

fn ready_status(addr: &str) -> String {
    format!("Accepting job triggers on {addr}")
}

fn draining_status(running_jobs: usize) -> String {
    match running_jobs {
        0 => "No jobs running, stopping".to_string(),
        1 => "Draining 1 job".to_string(),
        n => format!("Draining {n} jobs"),
    }
}

fn stopped_status(abandoned_jobs: usize) -> String {
    if abandoned_jobs == 0 {
        "Stopped".to_string()
    } else {
        format!("Stopped, {abandoned_jobs} job(s) abandoned")
    }
}

/// `SystemdLifecycle` when started by systemd (`NOTIFY_SOCKET` set),
/// `ConsoleLifecycle` otherwise.
pub fn detect_lifecycle() -> Box<dyn Lifecycle> {
    if std::env::var_os("NOTIFY_SOCKET").is_some() {
        Box::new(SystemdLifecycle)
    } else {
        Box::new(ConsoleLifecycle)
    }
}
