//! Error type shared by every HTTP handler.
//!
//! Each variant maps to one HTTP status; the response body is always
//! `{"detail": "<reason>"}` so the dashboard can show the reason verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::booking::BookingRejection;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input shape or range
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Capacity, dates, statuses
    #[error("{0}")]
    BusinessRule(String),

    /// Duplicate venue name, ticket category or booking code
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn not_found(entity: &str) -> Self {
        AppError::NotFound(format!("{} not found", entity))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BookingRejection> for AppError {
    fn from(rejection: BookingRejection) -> Self {
        let detail = rejection.to_string();
        match rejection {
            BookingRejection::EventNotFound | BookingRejection::TicketTypeNotFound => {
                AppError::NotFound(detail)
            }
            BookingRejection::EventNotActive(_)
            | BookingRejection::EventInPast
            | BookingRejection::CapacityExceeded { .. } => AppError::BusinessRule(detail),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                "Internal database error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// True when the error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventStatus;

    #[test]
    fn rejections_map_to_client_errors() {
        let not_found: AppError = BookingRejection::EventNotFound.into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let inactive: AppError = BookingRejection::EventNotActive(EventStatus::Cancelled).into();
        assert_eq!(inactive.status_code(), StatusCode::BAD_REQUEST);
        assert!(inactive.to_string().contains("cancelled"));

        let full: AppError = BookingRejection::CapacityExceeded { available: 2, requested: 3 }.into();
        assert_eq!(full.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            full.to_string(),
            "Not enough capacity. Available: 2, Requested: 3"
        );
    }

    #[test]
    fn database_errors_are_server_errors() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
