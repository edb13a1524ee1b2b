pub mod handler;
pub mod middleware;

use axum::{Router, middleware as axum_mw};
use batchgate_batch::import::ProductStore;
use batchgate_batch::{Job, JobLauncher, JobRepository};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub launcher: Arc<dyn JobLauncher>,
    pub import_product_job: Arc<dyn Job>,
    pub repository: Arc<JobRepository>,
    pub products: Arc<ProductStore>,
    pub body_limit_bytes: usize,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit_bytes = state.body_limit_bytes;

    let public_routes =
        Router::new().route("/health", axum::routing::get(handler::health::health));

    let job_routes = Router::new()
        .route(
            "/api/jobs/import-products",
            axum::routing::post(handler::jobs::import_products),
        )
        .route(
            "/api/jobs/executions",
            axum::routing::get(handler::jobs::list_executions),
        )
        .route(
            "/api/jobs/executions/{id}",
            axum::routing::get(handler::jobs::get_execution),
        )
        .route(
            "/api/products",
            axum::routing::get(handler::products::list_products),
        )
        .layer(RequestBodyLimitLayer::new(body_limit_bytes));

    // Global middleware layers, outer → inner:
    // trace, catch-panic, request context, request logging
    Router::new()
        .merge(public_routes)
        .merge(job_routes)
        .layer(axum_mw::from_fn(
            middleware::request_logging::request_logging_middleware,
        ))
        .layer(axum_mw::from_fn(
            middleware::request_context::request_context_middleware,
        ))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
