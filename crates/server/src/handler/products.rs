use crate::AppState;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

/// Products loaded by the import-product job, ordered by SKU.
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.products.list())
}
