//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Bodies follow three shapes: validation failures are a field map,
//! lookups that miss are `{"error": ...}`, and everything else is
//! `{"detail": ...}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::resources::ValidationErrors;
use crate::services::auth::AuthError;

/// Message returned for a failed password login.
pub const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";
/// Message returned when a bearer or refresh token is rejected.
pub const INVALID_TOKEN: &str = "Given token not valid for any token type";
/// Message returned when no credentials were supplied.
pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
/// Message returned when the caller's role may not perform the action.
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Input failed field validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(err) | Self::Auth(AuthError::Repository(err)) => matches!(
                err,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ),
            Self::Auth(AuthError::PasswordHash) => true,
            _ => false,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
            return detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }

        match self {
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            Self::Unauthorized(message) => detail(StatusCode::UNAUTHORIZED, &message),
            Self::Forbidden(message) => detail(StatusCode::FORBIDDEN, &message),
            Self::BadRequest(message) => detail(StatusCode::BAD_REQUEST, &message),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    detail(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS)
                }
                AuthError::InvalidToken(_) | AuthError::UserNotFound => {
                    detail(StatusCode::UNAUTHORIZED, INVALID_TOKEN)
                }
                AuthError::UserAlreadyExists => Self::Validation(ValidationErrors::single(
                    "username",
                    "A user with that username already exists.",
                ))
                .into_response(),
                AuthError::WeakPassword(message) => {
                    Self::Validation(ValidationErrors::single("password", message)).into_response()
                }
                AuthError::Repository(err) => Self::Database(err).into_response(),
                AuthError::PasswordHash => {
                    detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
            Self::Database(err) => match err {
                RepositoryError::NotFound => {
                    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
                }
                RepositoryError::Conflict(message) | RepositoryError::InvalidReference(message) => {
                    detail(StatusCode::BAD_REQUEST, &message)
                }
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
        }
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for an authenticated request.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
