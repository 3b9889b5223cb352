use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, dto::promo::PromoStatus};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Missing or wrong credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Caller is known but not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A unique resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Unexpected failure outside storage.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {err}"))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated caller lacks the right to act.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => {
                error!(error = %source, "storage operation failed");
                AppError::Internal("storage failure".into())
            }
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::Internal(message) => {
                error!(%message, "internal failure");
                AppError::Internal("internal failure".into())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    /// HTTP status the error renders with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let payload = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, payload).into_response()
    }
}

/// Failure outcomes of the promo code and claim endpoints, rendered as `{status}`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PromoError {
    #[error("invalid")]
    Invalid,
    #[error("forbidden")]
    Forbidden,
    #[error("unknown user")]
    UnknownUser,
    #[error("failed")]
    Failed,
}

impl PromoError {
    pub fn status(self) -> PromoStatus {
        match self {
            PromoError::Invalid => PromoStatus::Invalid,
            PromoError::Forbidden => PromoStatus::Forbidden,
            PromoError::UnknownUser => PromoStatus::UnknownUser,
            PromoError::Failed => PromoStatus::Failed,
        }
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            PromoError::Invalid | PromoError::UnknownUser => StatusCode::BAD_REQUEST,
            PromoError::Forbidden => StatusCode::FORBIDDEN,
            PromoError::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for PromoError {
    fn from(err: StorageError) -> Self {
        error!(error = %err, "promo storage operation failed");
        PromoError::Failed
    }
}

impl From<ServiceError> for PromoError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => source.into(),
            ServiceError::Degraded | ServiceError::Internal(_) => PromoError::Failed,
            ServiceError::Forbidden(_) | ServiceError::Unauthorized(_) => PromoError::Forbidden,
            ServiceError::InvalidInput(_)
            | ServiceError::InvalidState(_)
            | ServiceError::NotFound(_)
            | ServiceError::Conflict(_) => PromoError::Invalid,
        }
    }
}

#[derive(Serialize)]
struct PromoErrorBody {
    status: PromoStatus,
}

impl IntoResponse for PromoError {
    fn into_response(self) -> axum::response::Response {
        (
            self.http_status(),
            Json(PromoErrorBody {
                status: self.status(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promo_errors_map_to_documented_statuses() {
        assert_eq!(PromoError::Invalid.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(PromoError::UnknownUser.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(PromoError::Forbidden.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            PromoError::Failed.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_failures_hide_internals() {
        let err = ServiceError::Unavailable(StorageError::unavailable(
            "boom".into(),
            std::io::Error::other("disk on fire"),
        ));
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Internal(ref msg) if msg == "storage failure"));
    }
}
