//! JSON error responses

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use switchyard_core::HttpError;

/// Error body returned by every API route
///
/// Rendered as `{"error": {"type": ..., "message": ...}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error_type: String,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error_type: "invalid_request_error".to_owned(),
            message: message.into(),
        }
    }
}

impl<E: HttpError> From<E> for ApiError {
    fn from(error: E) -> Self {
        Self {
            status: error.status_code(),
            error_type: error.error_type().to_owned(),
            message: error.client_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = %self.status, error_type = %self.error_type, message = %self.message, "request failed");
        }

        let body = serde_json::json!({
            "error": {
                "type": self.error_type,
                "message": self.message,
            }
        });

        (self.status, Json(body)).into_response()
    }
}
