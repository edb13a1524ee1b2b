use crate::parameters::JobParameters;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Starting,
    Started,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Starting | Self::Started)
    }
}

/// Item counts reported by a finished job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub read_count: usize,
    pub write_count: usize,
    pub skip_count: usize,
}

/// One attempt to run a job instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecution {
    pub id: u64,
    pub instance_id: u64,
    pub job_name: String,
    pub parameters: JobParameters,
    pub status: JobStatus,
    pub create_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub summary: Option<StepSummary>,
    pub exit_message: Option<String>,
}

impl JobExecution {
    pub(crate) fn new(id: u64, instance_id: u64, job_name: &str, parameters: &JobParameters) -> Self {
        Self {
            id,
            instance_id,
            job_name: job_name.to_string(),
            parameters: parameters.clone(),
            status: JobStatus::Starting,
            create_time: Utc::now(),
            start_time: None,
            end_time: None,
            summary: None,
            exit_message: None,
        }
    }
}
