use std::time::Instant;

/// Per-request context carrying metadata for logging and diagnostics.
/// Injected as an axum `Extension` by the request-context middleware. Its
/// presence on a request also marks that the middleware already ran.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request identifier (UUID v4).
    pub request_id: String,
    /// Request URI path, without the query string.
    pub uri: String,
    /// When the request was received.
    pub start_time: Instant,
    /// Client IP address, if available.
    pub client_ip: Option<String>,
}

impl RequestContext {
    pub fn new(uri: impl Into<String>, client_ip: Option<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            uri: uri.into(),
            start_time: Instant::now(),
            client_ip,
        }
    }

    /// Returns elapsed time since request start.
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_has_unique_id() {
        let a = RequestContext::new("/a", None);
        let b = RequestContext::new("/a", None);
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_request_context_carries_uri_and_ip() {
        let ctx = RequestContext::new("/api/jobs/import-products", Some("10.0.0.1".into()));
        assert_eq!(ctx.uri, "/api/jobs/import-products");
        assert_eq!(ctx.client_ip.as_deref(), Some("10.0.0.1"));
    }
}
