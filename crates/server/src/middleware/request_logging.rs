use axum::{extract::Request, middleware::Next, response::Response};
use batchgate_core::context::RequestContext;
use batchgate_core::diagnostic::{self, URI_KEY};

/// Logs request received/completed lines. The logged path is the `uri`
/// diagnostic entry stamped by the request-context middleware, falling back
/// to the request path when that middleware is not installed.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let ctx = request.extensions().get::<RequestContext>().cloned();
    let path = diagnostic::get(URI_KEY).unwrap_or_else(|| request.uri().path().to_string());
    let client_ip = ctx
        .as_ref()
        .and_then(|c| c.client_ip.clone())
        .unwrap_or_else(|| "-".to_string());

    tracing::info!(
        client_ip = %client_ip,
        method = %method,
        path = %path,
        "Request received"
    );

    let response = next.run(request).await;

    let elapsed = ctx.as_ref().map(|c| c.elapsed_ms()).unwrap_or(0);
    let status = response.status().as_u16();

    if status >= 500 {
        tracing::warn!(status, elapsed_ms = elapsed as u64, "Request failed");
    } else {
        tracing::info!(status, elapsed_ms = elapsed as u64, "Request completed");
    }

    response
}
