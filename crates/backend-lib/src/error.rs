// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    BadPassword,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Authentication rate limit exceeded")]
    AuthRateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateUsername => StatusCode::CONFLICT,
            AppError::UserNotFound | AppError::BadPassword | AppError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            },
            AppError::AuthRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    ///
    /// `UserNotFound` and `BadPassword` share a code so a caller cannot tell
    /// which half of the credentials was wrong.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "AUTH_001",
            AppError::UserNotFound | AppError::BadPassword => "AUTH_002",
            AppError::AuthRateLimited => "AUTH_003",
            AppError::DuplicateUsername => "USER_001",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Whether this is one of the two login failures merged at the boundary
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, AppError::UserNotFound | AppError::BadPassword)
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            AppError::DuplicateUsername => "Username already exists".to_string(),
            AppError::UserNotFound | AppError::BadPassword => {
                "Invalid username or password".to_string()
            },
            AppError::Unauthenticated => "Authentication required".to_string(),
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Detailed messages in development, sanitized in production.
        // Login failures are always merged.
        let message = if cfg!(debug_assertions) && !self.is_credential_failure() {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        if let AppError::Internal(detail) = &self {
            tracing::error!(%detail, "request failed with internal error");
        }

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<scrypt::password_hash::Error> for AppError {
    fn from(err: scrypt::password_hash::Error) -> Self {
        AppError::Internal(format!("password hashing failed: {err}"))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {err}"))
    }
}
