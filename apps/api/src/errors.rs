use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthenticated")]
    Unauthenticated,

    /// Day-Copy found nothing on the source date. Reported, never retried.
    #[error("No status records on {date} to copy")]
    EmptySource { date: NaiveDate },

    #[error("Data access error: {0}")]
    DataAccess(#[from] StoreError),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => {
                tracing::warn!("Not found: {msg}");
                (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone())
            }
            AppError::Validation(msg) => {
                tracing::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Unauthenticated => {
                tracing::warn!("Write rejected: no acting identity");
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "An authenticated user is required for this operation".to_string(),
                )
            }
            AppError::EmptySource { .. } => {
                tracing::warn!("{self}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EMPTY_SOURCE",
                    self.to_string(),
                )
            }
            AppError::DataAccess(StoreError::Constraint(msg)) => {
                tracing::warn!("Constraint violation: {msg}");
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::DataAccess(e) => {
                tracing::error!("Data access error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATA_ACCESS_ERROR",
                    "The data backend could not complete the request".to_string(),
                )
            }
            AppError::Timeout(msg) => {
                tracing::error!("Timed out: {msg}");
                (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AppError::EmptySource { date }, StatusCode::UNPROCESSABLE_ENTITY),
            (
                AppError::DataAccess(StoreError::Constraint("dup".into())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::DataAccess(StoreError::Corrupt("bad".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::Timeout("copy".into()), StatusCode::GATEWAY_TIMEOUT),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_empty_source_message_names_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            AppError::EmptySource { date }.to_string(),
            "No status records on 2024-02-29 to copy"
        );
    }
}
