use crate::execution::JobExecution;
use crate::job::Job;
use crate::parameters::JobParameters;
use crate::repository::JobRepository;
use async_trait::async_trait;
use batchgate_core::diagnostic;
use batchgate_core::error::BatchError;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Instrument;

/// Starts jobs. Implementations return as soon as the run is registered and
/// must not wait for the job itself to finish.
#[async_trait]
pub trait JobLauncher: Send + Sync {
    async fn run(
        &self,
        job: Arc<dyn Job>,
        parameters: JobParameters,
    ) -> Result<JobExecution, BatchError>;
}

/// Launcher that runs each job on its own Tokio task.
pub struct TaskJobLauncher {
    repository: Arc<JobRepository>,
    closed: AtomicBool,
}

impl TaskJobLauncher {
    pub fn new(repository: Arc<JobRepository>) -> Self {
        Self {
            repository,
            closed: AtomicBool::new(false),
        }
    }

    pub fn repository(&self) -> &Arc<JobRepository> {
        &self.repository
    }

    /// Executions launched here that have not finished yet.
    pub fn running_jobs(&self) -> usize {
        self.repository.running_count()
    }

    /// Stop accepting new runs. Jobs already spawned keep running.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobLauncher for TaskJobLauncher {
    async fn run(
        &self,
        job: Arc<dyn Job>,
        parameters: JobParameters,
    ) -> Result<JobExecution, BatchError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BatchError::LauncherUnavailable);
        }

        let execution = self.repository.create_execution(job.name(), &parameters)?;
        let execution_id = execution.id;
        tracing::info!(
            job = %job.name(),
            execution_id,
            parameters = %parameters,
            diagnostic = ?diagnostic::snapshot(),
            "Job launched"
        );

        let repository = self.repository.clone();
        let span = tracing::info_span!("job", job = %job.name(), execution_id);
        tokio::spawn(
            async move {
                repository.mark_started(execution_id);
                let outcome = AssertUnwindSafe(job.execute(&parameters))
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(summary)) => {
                        tracing::info!(
                            read = summary.read_count,
                            written = summary.write_count,
                            skipped = summary.skip_count,
                            "Job completed"
                        );
                        repository.mark_completed(execution_id, summary);
                    }
                    Ok(Err(e)) => {
                        tracing::error!("Job failed: {e}");
                        repository.mark_failed(execution_id, e.to_string());
                    }
                    Err(_) => {
                        tracing::error!("Job panicked");
                        repository.mark_failed(execution_id, "job panicked".to_string());
                    }
                }
            }
            .instrument(span),
        );

        Ok(execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{JobStatus, StepSummary};
    use crate::parameters::JobParametersBuilder;
    use std::time::Duration;
    use tokio::sync::Notify;

    enum Behavior {
        Succeed,
        Fail,
        Panic,
    }

    struct TestJob {
        behavior: Behavior,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl Job for TestJob {
        fn name(&self) -> &str {
            "testJob"
        }

        async fn execute(&self, _parameters: &JobParameters) -> Result<StepSummary, BatchError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.behavior {
                Behavior::Succeed => Ok(StepSummary {
                    read_count: 1,
                    write_count: 1,
                    skip_count: 0,
                }),
                Behavior::Fail => Err(BatchError::Input("missing file".into())),
                Behavior::Panic => panic!("job blew up"),
            }
        }
    }

    fn job(behavior: Behavior) -> Arc<dyn Job> {
        Arc::new(TestJob {
            behavior,
            gate: None,
        })
    }

    fn params(ts: i64) -> JobParameters {
        JobParametersBuilder::new().add_long("ts", ts).to_job_parameters()
    }

    async fn wait_for_finish(repo: &JobRepository, id: u64) -> JobExecution {
        for _ in 0..200 {
            if let Some(exec) = repo.get(id)
                && !exec.status.is_running()
            {
                return exec;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("execution {id} did not finish");
    }

    #[tokio::test]
    async fn test_run_returns_before_job_finishes() {
        let repo = Arc::new(JobRepository::new(10));
        let launcher = TaskJobLauncher::new(repo.clone());
        let gate = Arc::new(Notify::new());
        let gated: Arc<dyn Job> = Arc::new(TestJob {
            behavior: Behavior::Succeed,
            gate: Some(gate.clone()),
        });

        let exec = launcher.run(gated, params(1)).await.unwrap();
        assert_eq!(exec.status, JobStatus::Starting);
        assert!(repo.get(exec.id).unwrap().status.is_running());
        assert_eq!(launcher.running_jobs(), 1);

        gate.notify_one();
        let done = wait_for_finish(&repo, exec.id).await;
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(launcher.running_jobs(), 0);
        assert_eq!(done.summary.map(|s| s.read_count), Some(1));
    }

    #[tokio::test]
    async fn test_job_error_marks_failed() {
        let repo = Arc::new(JobRepository::new(10));
        let launcher = TaskJobLauncher::new(repo.clone());
        let exec = launcher.run(job(Behavior::Fail), params(1)).await.unwrap();
        let done = wait_for_finish(&repo, exec.id).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert!(done.exit_message.unwrap().contains("missing file"));
    }

    #[tokio::test]
    async fn test_job_panic_marks_failed() {
        let repo = Arc::new(JobRepository::new(10));
        let launcher = TaskJobLauncher::new(repo.clone());
        let exec = launcher.run(job(Behavior::Panic), params(1)).await.unwrap();
        let done = wait_for_finish(&repo, exec.id).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert_eq!(done.exit_message.as_deref(), Some("job panicked"));
    }

    #[tokio::test]
    async fn test_duplicate_parameters_rejected_after_completion() {
        let repo = Arc::new(JobRepository::new(10));
        let launcher = TaskJobLauncher::new(repo.clone());
        let exec = launcher.run(job(Behavior::Succeed), params(7)).await.unwrap();
        wait_for_finish(&repo, exec.id).await;

        let err = launcher
            .run(job(Behavior::Succeed), params(7))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::JobInstanceAlreadyComplete { .. }));
    }

    #[tokio::test]
    async fn test_closed_launcher_rejects_runs() {
        let repo = Arc::new(JobRepository::new(10));
        let launcher = TaskJobLauncher::new(repo.clone());
        launcher.close();
        let err = launcher
            .run(job(Behavior::Succeed), params(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::LauncherUnavailable));
        assert!(repo.list().is_empty());
    }
}
