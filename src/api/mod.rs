//! API module for all HTTP handlers

pub mod health;
pub mod webhook;

use std::any::Any;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing,
};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use crate::SharedState;
use crate::error::RelayError;

// Re-export handlers
pub use health::{health, root};
pub use webhook::handle_webhook;

/// GitHub caps webhook payloads at 25 MB.
pub const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

const AVAILABLE_ENDPOINTS: [&str; 3] = ["/", "/health", "/webhook"];

/// Builds the application router.
pub fn router(state: SharedState) -> Router {
    let routes = Router::new()
        .route("/", routing::get(root).fallback(not_found))
        .route("/health", routing::get(health).fallback(not_found))
        .route(
            "/webhook",
            routing::post(handle_webhook).fallback(not_found),
        )
        .fallback(not_found);

    with_layers(routes).with_state(state)
}

/// Wraps `routes` in the middleware every endpoint shares: the payload limit
/// and a panic guard that answers 500 instead of dropping the connection.
pub fn with_layers(routes: Router<SharedState>) -> Router<SharedState> {
    routes
        .layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic))
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic payload"
    };
    error!("Unhandled panic while serving request: {}", detail);

    ApiError::Internal.into_response()
}

/// Errors surfaced to the HTTP caller.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    BadRequest,
    NotFound,
    Internal,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Invalid signature",
            ),
            Self::BadRequest => (
                StatusCode::BAD_REQUEST,
                "Bad Request",
                "Invalid JSON payload",
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                "Not Found",
                "The requested endpoint was not found",
            ),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "Internal server error",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();
        let mut body = json!({
            "error": error,
            "message": message,
            "status_code": status.as_u16(),
        });
        if matches!(self, Self::NotFound) {
            body["available_endpoints"] = json!(AVAILABLE_ENDPOINTS);
        }

        (status, Json(body)).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::WebhookValidationFailed(_) => Self::Unauthorized,
            RelayError::MalformedPayload(_) => Self::BadRequest,
            other => {
                // detail stays in the server log
                error!("Unexpected error in webhook endpoint: {}", other);
                Self::Internal
            }
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn error_bodies_name_the_failure() {
        let (status, body) = body_json(ApiError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["status_code"], 401);

        let (status, body) = body_json(ApiError::BadRequest).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad Request");

        let (status, body) = body_json(ApiError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["available_endpoints"][2], "/webhook");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let err: ApiError = RelayError::ConfigError("secret value leaked?".into()).into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(!body.to_string().contains("secret value"));
    }

    #[test]
    fn relay_errors_map_to_status_classes() {
        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            ApiError::from(RelayError::MalformedPayload(bad_json)),
            ApiError::BadRequest
        ));
        assert!(matches!(
            ApiError::from(RelayError::WebhookValidationFailed("bad".into())),
            ApiError::Unauthorized
        ));
    }
}
