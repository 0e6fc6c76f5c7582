/// Error types for Story Service
///
/// Every failure is converted at the handler boundary into a rendered page
/// or a redirect; nothing escapes to the transport layer uncaught. Absent
/// records render the not-found page, validation failures render the
/// bad-request page, and a missing identity redirects to the login entry
/// point.
use actix_web::http::header::LOCATION;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::views;

/// Result type for story-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation failed
    #[error("validation failed: {0}")]
    Validation(String),

    /// Resource not found
    #[error("not found")]
    NotFound,

    /// No recognized identity attached to the request
    #[error("not signed in")]
    Unauthenticated,

    /// Remote image storage failed
    #[error("media storage error: {0}")]
    Media(String),

    /// Template rendering failed
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::SEE_OTHER,
            AppError::Database(_)
            | AppError::Media(_)
            | AppError::Template(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthenticated => HttpResponse::SeeOther()
                .insert_header((LOCATION, crate::handlers::LOGIN_PATH))
                .finish(),
            _ => {
                let status = self.status_code();
                if status.is_server_error() {
                    tracing::error!("request failed: {}", self);
                }
                views::error_page(status)
            }
        }
    }
}
