//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (record in span, Sentry scope and response header)
//! 4. Security headers (CSP, frame denial, etc.)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting (governor) on auth and JSON API routes
//!
//! Authentication is done per handler with the extractors in [`auth`].

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, OptionalUser, RequireAdmin, RequireUser, clear_current_user, set_current_user,
};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
