//! Request ID middleware for request tracing and correlation.
//!
//! Reuses the `x-request-id` header from an upstream proxy when it looks
//! sane, otherwise generates a UUID v4. The ID is recorded in the current
//! span, tagged on the Sentry scope and echoed in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request ID accepted as-is.
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// Whether an upstream request ID can be logged and echoed back.
fn is_acceptable(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LENGTH
        && id.bytes().all(|b| b.is_ascii_graphic())
}

/// Pick the request ID for `request`.
fn request_id_for(request: &Request) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| is_acceptable(id))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id_for(&request);

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request_with(id: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/");
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_upstream_id_is_kept() {
        let req = request_with(Some("cf-7d1a9e"));
        assert_eq!(request_id_for(&req), "cf-7d1a9e");
    }

    #[test]
    fn test_missing_id_is_generated() {
        let id = request_id_for(&request_with(None));
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_oversized_or_spaced_id_is_replaced() {
        let long = "a".repeat(MAX_REQUEST_ID_LENGTH + 1);
        assert!(Uuid::parse_str(&request_id_for(&request_with(Some(&long)))).is_ok());
        assert!(Uuid::parse_str(&request_id_for(&request_with(Some("a b")))).is_ok());
    }
}
