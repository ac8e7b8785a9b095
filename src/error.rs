use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::matching::MatchError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed query parameters, request bodies or filter expressions
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Presented credential does not match any known credential
    #[error("Invalid credentials")]
    AuthInvalid,

    /// Not found errors (routing fallback)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Method not allowed on this route
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AuthInvalid => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::AuthInvalid => "AUTH_INVALID",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            AppError::Serialization(_) => "SERVER_ERROR",
            AppError::Internal(_) => "SERVER_ERROR",
        }
    }

    /// Message surfaced to the caller. Internal failures stay generic;
    /// everything else is descriptive.
    fn public_message(&self) -> String {
        match self {
            AppError::Serialization(_) | AppError::Internal(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Convert AppError to the JSON error envelope
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.public_message();

        tracing::error!(
            error_code = error_code,
            status_code = status.as_u16(),
            message = %self,
            "Request error"
        );

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Matching primitive failures are caller mistakes (unknown mode, bad
/// expression, bad pattern), surfaced as BadRequest
impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
