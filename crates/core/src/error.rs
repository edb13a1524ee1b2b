use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Unified error type for job launching, job execution and the HTTP surface.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("a job instance already exists and is complete for job {job} with parameters {parameters}")]
    JobInstanceAlreadyComplete { job: String, parameters: String },

    #[error("a job execution for job {job} with parameters {parameters} is already running")]
    JobExecutionAlreadyRunning { job: String, parameters: String },

    #[error("job launcher is not accepting new executions")]
    LauncherUnavailable,

    #[error("job execution not found: {0}")]
    ExecutionNotFound(u64),

    #[error("input error: {0}")]
    Input(String),

    #[error("skip limit of {limit} exceeded")]
    SkipLimitExceeded { limit: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl BatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::LauncherUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::ExecutionNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::JobInstanceAlreadyComplete { .. } | Self::JobExecutionAlreadyRunning { .. } => {
                "job_launch_error"
            }
            Self::LauncherUnavailable => "unavailable",
            Self::ExecutionNotFound(_) => "not_found",
            _ => "server_error",
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Self::JobInstanceAlreadyComplete { .. } => "job_instance_already_complete",
            Self::JobExecutionAlreadyRunning { .. } => "job_execution_already_running",
            Self::LauncherUnavailable => "launcher_unavailable",
            Self::ExecutionNotFound(_) => "execution_not_found",
            Self::SkipLimitExceeded { .. } => "skip_limit_exceeded",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for BatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": {
                "message": self.to_string(),
                "type": self.error_type(),
                "code": self.error_code(),
            }
        });

        (
            status,
            [("content-type", "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

impl From<std::io::Error> for BatchError {
    fn from(e: std::io::Error) -> Self {
        Self::Input(e.to_string())
    }
}
