//! In-memory store of job instances and their executions.

use crate::execution::{JobExecution, JobStatus, StepSummary};
use crate::parameters::JobParameters;
use batchgate_core::error::BatchError;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct InstanceState {
    id: u64,
    running_execution: Option<u64>,
    completed: bool,
    /// Executions of this instance still held in `Inner::executions`.
    retained: usize,
}

#[derive(Debug, Default)]
struct Inner {
    instances: HashMap<(String, JobParameters), InstanceState>,
    executions: BTreeMap<u64, JobExecution>,
    next_instance_id: u64,
    next_execution_id: u64,
}

/// Job instances are identified by job name plus parameters. An instance can
/// have at most one running execution, and once one execution completes the
/// instance cannot be run again. A failed instance may be restarted.
///
/// Finished executions beyond `capacity` are evicted oldest first. An
/// instance is dropped together with its last retained execution unless it
/// completed: completed instances are the record that rejects reruns of the
/// same parameters, so they live as long as the repository.
pub struct JobRepository {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl JobRepository {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_instance_id: 1,
                next_execution_id: 1,
                ..Inner::default()
            }),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new execution in `Starting` state, or reject the launch.
    pub fn create_execution(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<JobExecution, BatchError> {
        let mut inner = self.lock();
        let Inner {
            instances,
            executions,
            next_instance_id,
            next_execution_id,
        } = &mut *inner;

        let instance = instances
            .entry((job_name.to_string(), parameters.clone()))
            .or_insert_with(|| {
                let id = *next_instance_id;
                *next_instance_id += 1;
                InstanceState {
                    id,
                    ..InstanceState::default()
                }
            });

        if instance.running_execution.is_some() {
            return Err(BatchError::JobExecutionAlreadyRunning {
                job: job_name.to_string(),
                parameters: parameters.to_string(),
            });
        }
        if instance.completed {
            return Err(BatchError::JobInstanceAlreadyComplete {
                job: job_name.to_string(),
                parameters: parameters.to_string(),
            });
        }

        let id = *next_execution_id;
        *next_execution_id += 1;
        instance.running_execution = Some(id);
        instance.retained += 1;

        let execution = JobExecution::new(id, instance.id, job_name, parameters);
        executions.insert(id, execution.clone());
        Ok(execution)
    }

    pub fn mark_started(&self, id: u64) {
        let mut inner = self.lock();
        if let Some(execution) = inner.executions.get_mut(&id) {
            execution.status = JobStatus::Started;
            execution.start_time = Some(Utc::now());
        }
    }

    pub fn mark_completed(&self, id: u64, summary: StepSummary) {
        self.finish(id, JobStatus::Completed, Some(summary), None);
    }

    pub fn mark_failed(&self, id: u64, message: String) {
        self.finish(id, JobStatus::Failed, None, Some(message));
    }

    fn finish(
        &self,
        id: u64,
        status: JobStatus,
        summary: Option<StepSummary>,
        exit_message: Option<String>,
    ) {
        let mut inner = self.lock();
        let Some(execution) = inner.executions.get_mut(&id) else {
            return;
        };
        execution.status = status;
        execution.end_time = Some(Utc::now());
        execution.summary = summary;
        execution.exit_message = exit_message;
        let key = (execution.job_name.clone(), execution.parameters.clone());

        if let Some(instance) = inner.instances.get_mut(&key) {
            instance.running_execution = None;
            if status == JobStatus::Completed {
                instance.completed = true;
            }
        }

        Self::evict(&mut inner, self.capacity);
    }

    fn evict(inner: &mut Inner, capacity: usize) {
        while inner.executions.len() > capacity {
            let oldest_finished = inner
                .executions
                .iter()
                .find(|(_, e)| !e.status.is_running())
                .map(|(id, _)| *id);
            let Some(evicted) = oldest_finished.and_then(|id| inner.executions.remove(&id))
            else {
                break;
            };

            let key = (evicted.job_name, evicted.parameters);
            let prune = match inner.instances.get_mut(&key) {
                Some(instance) => {
                    instance.retained = instance.retained.saturating_sub(1);
                    instance.retained == 0
                        && !instance.completed
                        && instance.running_execution.is_none()
                }
                None => false,
            };
            if prune {
                inner.instances.remove(&key);
            }
        }
    }

    pub fn get(&self, id: u64) -> Option<JobExecution> {
        self.lock().executions.get(&id).cloned()
    }

    /// All retained executions, newest first.
    pub fn list(&self) -> Vec<JobExecution> {
        self.lock().executions.values().rev().cloned().collect()
    }

    /// Executions not yet completed or failed.
    pub fn running_count(&self) -> usize {
        self.lock()
            .executions
            .values()
            .filter(|e| e.status.is_running())
            .count()
    }

    #[cfg(test)]
    fn instance_count(&self) -> usize {
        self.lock().instances.len()
    }
}
