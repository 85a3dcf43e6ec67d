//! HTTP error mapping.
//!
//! Storage failures are logged here and reported to clients with a generic
//! message; internal detail never leaves the process.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::{persist::PersistError, runtime::handle::LedgerError};

/// Error body: `{"code": "E0003", "message": "Not found"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable error code.
    pub code: &'static str,
    /// Human readable message.
    pub message: String,
}

/// Errors returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    /// 404
    NotFound(String),

    #[error("Database error: {0}")]
    /// 500, registration dataset
    Database(String),

    #[error("Ledger error: {0}")]
    /// 500, attendance ledger
    Ledger(String),
}

/// Result alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Database error".to_string(),
                )
            }
            AppError::Ledger(msg) => {
                error!(target: "ledger", error = %msg, "Ledger error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9003",
                    "Attendance ledger error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { code, message })).into_response()
    }
}

impl From<PersistError> for AppError {
    fn from(e: PersistError) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        AppError::Ledger(e.to_string())
    }
}
