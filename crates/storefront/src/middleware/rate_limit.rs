//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - [`auth_rate_limiter`]: login and registration (~10/min per IP)
//! - [`api_rate_limiter`]: the JSON cart API (~100/min per IP)
//!
//! The server must be started with
//! `into_make_service_with_connect_info::<SocketAddr>()` so the socket
//! address is available as the fallback key.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Keys requests by client IP.
///
/// Proxy headers are only consulted when the deployment sits behind a
/// trusted reverse proxy; otherwise any client could pick its own key.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    /// Create an extractor.
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self {
            trust_proxy_headers,
        }
    }
}

/// First parseable client IP from `X-Forwarded-For` or `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.trust_proxy_headers
            && let Some(ip) = forwarded_ip(req.headers())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// Does not panic: `per_second(6)` and `burst_size(5)` are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for the JSON cart API: ~100 requests per minute per IP.
///
/// Configuration: one request every 600ms (replenish), burst of 50.
///
/// # Panics
///
/// Does not panic: `per_millisecond(600)` and `burst_size(50)` are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_millisecond(600)
        .burst_size(50)
        .finish()
        .expect("rate limiter config with per_millisecond(600) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(forwarded: Option<&str>, peer: Option<SocketAddr>) -> Request<()> {
        let mut builder = Request::builder().uri("/auth/login");
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut req = builder.body(()).unwrap();
        if let Some(addr) = peer {
            req.extensions_mut().insert(ConnectInfo(addr));
        }
        req
    }

    #[test]
    fn test_socket_address_used_by_default() {
        let peer: SocketAddr = "10.0.0.7:5555".parse().unwrap();
        let req = request(Some("203.0.113.9"), Some(peer));
        let key = ClientIpKeyExtractor::new(false).extract(&req).unwrap();
        assert_eq!(key, peer.ip());
    }

    #[test]
    fn test_forwarded_header_used_when_trusted() {
        let peer: SocketAddr = "10.0.0.7:5555".parse().unwrap();
        let req = request(Some("203.0.113.9, 10.0.0.1"), Some(peer));
        let key = ClientIpKeyExtractor::new(true).extract(&req).unwrap();
        assert_eq!(key, "203.0.113.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_no_key_without_connect_info() {
        let req = request(None, None);
        assert!(ClientIpKeyExtractor::new(true).extract(&req).is_err());
    }
}
