use crate::execution::StepSummary;
use crate::parameters::JobParameters;
use async_trait::async_trait;
use batchgate_core::error::BatchError;

/// A named unit of batch work.
#[async_trait]
pub trait Job: Send + Sync {
    /// Job name; together with the parameters it forms the run identity.
    fn name(&self) -> &str;

    async fn execute(&self, parameters: &JobParameters) -> Result<StepSummary, BatchError>;
}
