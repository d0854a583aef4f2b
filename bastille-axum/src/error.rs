use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockoutHttpError {
    /// Signature mismatch or expired capability link. The action is never
    /// executed.
    #[error("Invalid or expired link")]
    InvalidCapability,

    /// The identifier is currently locked out.
    #[error("{0}")]
    Locked(String),
}

impl IntoResponse for LockoutHttpError {
    fn into_response(self) -> Response {
        match self {
            LockoutHttpError::InvalidCapability => {
                let body = Json(json!({
                    "error": "Invalid or expired link",
                    "code": StatusCode::FORBIDDEN.as_u16()
                }));
                (StatusCode::FORBIDDEN, body).into_response()
            }
            LockoutHttpError::Locked(message) => {
                let body = Json(json!({ "message": message }));
                (StatusCode::TOO_MANY_REQUESTS, body).into_response()
            }
        }
    }
}
