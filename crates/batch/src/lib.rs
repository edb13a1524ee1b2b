pub mod execution;
pub mod import;
pub mod job;
pub mod launcher;
pub mod parameters;
pub mod repository;

pub use execution::{JobExecution, JobStatus, StepSummary};
pub use job::Job;
pub use launcher::{JobLauncher, TaskJobLauncher};
pub use parameters::{JobParameter, JobParameters, JobParametersBuilder};
pub use repository::JobRepository;
