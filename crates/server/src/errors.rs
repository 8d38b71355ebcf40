use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

/// JSON error body for transport-level failures (auth gate, lookups).
/// Engine outcomes travel as `AuthResult` instead.
#[derive(Debug, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, detail: Option<String>) -> Self {
        Self { status, error: error.into(), detail }
    }

    pub fn unauthorized(detail: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(detail.to_string()))
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden", Some("admin role required".into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.error, detail = ?self.detail, "request failed");
        }
        (self.status, Json(self)).into_response()
    }
}
