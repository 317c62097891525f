//! JSON API route handlers.
//!
//! Errors are returned as JSON bodies with the same status codes as the HTML
//! routes use.

pub mod cart;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AppError;
use crate::services::CartError;

/// [`AppError`] rendered as a JSON body.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E: Into<AppError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// Stable machine-readable code for the error.
    const fn code(&self) -> &'static str {
        match &self.0 {
            AppError::Cart(CartError::InsufficientStock { .. }) => "insufficient_stock",
            AppError::Cart(CartError::ProductNotFound(_)) => "product_not_found",
            AppError::Cart(CartError::LineNotFound(_)) => "line_not_found",
            AppError::Cart(CartError::QuantityOverflow) => "quantity_overflow",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            _ => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = self.0.status();
        let message = self.0.public_message();

        let body = match &self.0 {
            AppError::Cart(CartError::InsufficientStock {
                requested,
                available,
            }) => json!({
                "error": code,
                "message": message,
                "requested": requested,
                "available": available,
            }),
            _ => json!({ "error": code, "message": message }),
        };

        self.0.report();

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use canteen_core::{Quantity, Stock};

    use super::*;

    #[tokio::test]
    async fn test_insufficient_stock_body() {
        let err = ApiError::from(CartError::InsufficientStock {
            requested: Quantity::new(5).unwrap(),
            available: Stock::new(2).unwrap(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "insufficient_stock");
        assert_eq!(body["requested"], 5);
        assert_eq!(body["available"], 2);
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let response = ApiError::from(AppError::BadRequest("quantity".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
