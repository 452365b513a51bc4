use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Failures of the tracker operations. Every public operation returns these as
/// values; nothing panics across the library boundary.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TrackerError::NotFound { .. } | TrackerError::Database(diesel::result::Error::NotFound)
        )
    }
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "resource not found")
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<TrackerError> for AppError {
    fn from(value: TrackerError) -> Self {
        match value {
            TrackerError::Validation(_) | TrackerError::InvalidTransition { .. } => {
                AppError::bad_request(value.to_string())
            }
            TrackerError::NotFound { .. } => {
                AppError::new(StatusCode::NOT_FOUND, value.to_string())
            }
            TrackerError::Database(diesel::result::Error::NotFound) => AppError::not_found(),
            _ => AppError::internal(value),
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(value: diesel::result::Error) -> Self {
        match value {
            diesel::result::Error::NotFound => AppError::not_found(),
            _ => AppError::internal(value),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::internal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_tracker_errors_to_http_status() {
        let err: AppError = TrackerError::validation("bad").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = TrackerError::not_found("submission", "abc").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "submission abc not found");

        let err: AppError = TrackerError::InvalidTransition {
            from: "Archived".into(),
            to: "Submitted".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = TrackerError::Transaction("boom".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn diesel_not_found_counts_as_not_found() {
        assert!(TrackerError::Database(diesel::result::Error::NotFound).is_not_found());
        assert!(TrackerError::not_found("side quest", "x").is_not_found());
        assert!(!TrackerError::validation("x").is_not_found());
    }
}
