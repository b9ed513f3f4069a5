//! Error types for the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use step_counter_core::aggregation::AggregationError;
use step_counter_core::goal::GoalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid goal: {0}")]
    InvalidGoal(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("goal storage error: {0}")]
    Goal(GoalError),

    #[error("aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GoalError> for AppError {
    fn from(err: GoalError) -> Self {
        match err {
            GoalError::InvalidGoal(msg) => AppError::InvalidGoal(msg),
            other => AppError::Goal(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidGoal(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            AppError::Goal(_) | AppError::Aggregation(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
