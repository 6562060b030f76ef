//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use blog_core::error::{DomainError, RepoError};
use blog_core::ports::AuthError;
use blog_shared::dto::field_violations;
use blog_shared::{ErrorResponse, FieldViolation};
use validator::ValidationErrors;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldViolation>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => ErrorResponse::unauthorized()
                .with_detail("Please enter a correct username and password."),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Validation(errors) => ErrorResponse::validation_failed(errors.clone()),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity, .. } => {
                AppError::NotFound(format!("No {entity} matches the given query."))
            }
            DomainError::Validation(errors) => {
                tracing::debug!(fields = errors.len(), "Form rejected");
                AppError::Validation(
                    errors
                        .into_iter()
                        .map(|e| FieldViolation {
                            field: e.field,
                            message: e.message,
                        })
                        .collect(),
                )
            }
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::Unauthorized => AppError::Unauthorized,
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            other => DomainError::from(other).into(),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let violations = field_violations(&errors);
        tracing::debug!(fields = violations.len(), "Form rejected");
        AppError::Validation(violations)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::HashingError(msg) => AppError::Internal(msg),
            _ => AppError::Unauthorized,
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
