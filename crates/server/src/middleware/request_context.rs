use axum::{extract::Request, middleware::Next, response::Response};
use batchgate_core::context::RequestContext;
use batchgate_core::diagnostic::{self, URI_KEY};
use tracing::Instrument;

/// Middleware that stamps the request URI into the diagnostic context for the
/// lifetime of the request and injects a `RequestContext` extension.
///
/// Runs once per request: if an outer application of this middleware already
/// left a `RequestContext` on the request, it delegates untouched. The `uri`
/// entry is removed when the downstream future finishes, is dropped, or
/// unwinds; downstream errors and panics pass through unchanged.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    if request.extensions().get::<RequestContext>().is_some() {
        return next.run(request).await;
    }

    let uri = request.uri().path().to_string();
    let ctx = RequestContext::new(uri.clone(), client_ip(&request));
    let span = tracing::info_span!("request", request_id = %ctx.request_id, uri = %uri);
    request.extensions_mut().insert(ctx);

    diagnostic::scoped_entry(URI_KEY, uri, next.run(request))
        .instrument(span)
        .await
}

fn client_ip(request: &Request) -> Option<String> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}
