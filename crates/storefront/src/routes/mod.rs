//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//! GET  /menu                      - Product menu
//!
//! # Cart (requires user)
//! GET  /cart                      - Cart page
//! POST /cart/add/{product_id}     - Reserve units (form `quantity`)
//! POST /cart/remove/{line_id}     - Remove a line and release its units
//!
//! # Cart JSON API (requires user, rate limited)
//! GET    /api/cart                - Cart snapshot
//! POST   /api/cart/lines          - Reserve units
//! DELETE /api/cart/lines/{id}     - Remove a line
//!
//! # Auth (rate limited)
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! GET  /auth/register             - Register page
//! POST /auth/register             - Register action
//! POST /auth/logout               - Logout action
//!
//! # Profile (requires user)
//! GET  /profile                   - Profile page
//! GET  /profile/edit              - Profile form
//! POST /profile/edit              - Save profile
//!
//! # Admin (requires admin)
//! GET  /admin                     - Panel
//! GET  /admin/products            - Inventory
//! POST /admin/products            - Create product
//! POST /admin/products/{id}/quantity - Set stock directly
//! POST /admin/products/{id}/delete   - Delete product
//! GET  /admin/users               - User list
//! ```

pub mod account;
pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod home;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, create_session_layer, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Directory served under `/static`.
const STATIC_DIR: &str = "crates/storefront/static";

/// Create the auth routes router.
pub fn auth_routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter(trust_proxy_headers))
}

/// Create the cart page routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{product_id}", post(cart::add))
        .route("/remove/{line_id}", post(cart::remove))
}

/// Create the JSON API router.
pub fn api_routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/cart", get(api::cart::show))
        .route("/cart/lines", post(api::cart::add))
        .route("/cart/lines/{id}", axum::routing::delete(api::cart::remove))
        .layer(api_rate_limiter(trust_proxy_headers))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::profile))
        .route("/edit", get(account::edit_page).post(account::update))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route(
            "/products",
            get(admin::products).post(admin::create_product),
        )
        .route("/products/{id}/quantity", post(admin::set_quantity))
        .route("/products/{id}/delete", post(admin::delete_product))
        .route("/users", get(admin::users))
}

/// Create all routes for the storefront.
pub fn routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/menu", get(home::menu))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/cart", cart_routes())
        .nest("/api", api_routes(trust_proxy_headers))
        .nest("/auth", auth_routes(trust_proxy_headers))
        .nest("/profile", profile_routes())
        .nest("/admin", admin_routes())
}

/// Build the complete application with sessions, request IDs, tracing and
/// security headers.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());
    let trust_proxy_headers = state.config().trust_proxy_headers;

    Router::new()
        .merge(routes(trust_proxy_headers))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::header::LOCATION;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;

    /// App backed by a lazy pool. Anonymous requests never open a connection.
    fn test_app() -> Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://canteen@localhost/canteen_test"),
            host: [127, 0, 0, 1].into(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            trust_proxy_headers: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://canteen@localhost/canteen_test")
            .unwrap();
        app(AppState::new(config, pool))
    }

    fn get_request(uri: &str) -> Request {
        let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        request
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("content-security-policy"));
    }

    #[tokio::test]
    async fn test_anonymous_cart_page_redirects_to_login() {
        let response = test_app().oneshot(get_request("/cart")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/auth/login");
    }

    #[tokio::test]
    async fn test_anonymous_api_is_unauthorized() {
        let response = test_app().oneshot(get_request("/api/cart")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_anonymous_admin_redirects_to_login() {
        let response = test_app().oneshot(get_request("/admin")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = test_app()
            .oneshot(get_request("/auth/login"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_app()
            .oneshot(get_request("/does-not-exist"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
