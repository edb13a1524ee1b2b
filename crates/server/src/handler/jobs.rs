use crate::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use batchgate_batch::{JobExecution, JobParametersBuilder};
use batchgate_core::error::BatchError;

/// Start the import-product job without waiting for it to finish.
///
/// Each call gets a fresh `ts` parameter, so repeated triggers are distinct
/// job instances. Launch rejections surface as error responses unchanged.
pub async fn import_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, BatchError> {
    let parameters = JobParametersBuilder::new()
        .add_long("ts", chrono::Utc::now().timestamp_millis())
        .to_job_parameters();
    tracing::info!("Triggering job with params {parameters}");

    state
        .launcher
        .run(state.import_product_job.clone(), parameters)
        .await?;

    Ok((StatusCode::ACCEPTED, "Job started"))
}

pub async fn list_executions(State(state): State<AppState>) -> Json<Vec<JobExecution>> {
    Json(state.repository.list())
}

pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<JobExecution>, BatchError> {
    state
        .repository
        .get(id)
        .map(Json)
        .ok_or(BatchError::ExecutionNotFound(id))
}
