//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Structured JSON error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error type that converts to responses
#[derive(Debug)]
pub enum ApiError {
    /// Webhook delivery failed signature verification
    InvalidSignature,
    /// Subscription handshake did not match
    VerificationFailed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidSignature => (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "Invalid signature".to_string(),
                    code: Some("invalid_signature".to_string()),
                }),
            )
                .into_response(),
            // Plain text, the provider only checks the status
            ApiError::VerificationFailed => {
                (StatusCode::FORBIDDEN, "Verification failed").into_response()
            }
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
