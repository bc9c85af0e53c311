//! Crate-wide error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use polars::prelude::PolarsError;
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Raised when the market data provider fails for one or more tickers
    #[error("ticker(s): {ticker}, have {message} issue")]
    Provider { ticker: String, message: String },

    /// Misuse of an indicator or a table it cannot work with
    #[error("{0}")]
    Indicator(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Table error: {0}")]
    Polars(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl AppError {
    pub fn provider(ticker: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Provider {
            ticker: ticker.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Provider { .. } => StatusCode::BAD_GATEWAY,
            AppError::Indicator(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Database(_)
            | AppError::Polars(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<PolarsError> for AppError {
    fn from(err: PolarsError) -> Self {
        AppError::Polars(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Io(format!("CSV error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_names_ticker() {
        let err = AppError::provider("INFY", "got empty dataframe");
        assert_eq!(err.to_string(), "ticker(s): INFY, have got empty dataframe issue");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidInput("x".into()).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::provider("A", "b").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::Indicator("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Database("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
