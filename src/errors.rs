use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::repository::RepositoryError;

/// Malformed caller input, rejected before any side effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Domain error taxonomy shared by every service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Insufficient coins: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },
    #[error("{0} not found")]
    NotFound(String),
    #[error("Persistence error: {0}")]
    Persistence(RepositoryError),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InsufficientFunds { balance, requested } => {
                ServiceError::InsufficientFunds { balance, requested }
            }
            RepositoryError::NotFound(what) => ServiceError::NotFound(what),
            RepositoryError::BalanceOverflow { .. } => ServiceError::Validation(ValidationError::new(
                "amount",
                "Amount would overflow the coin balance",
            )),
            other => ServiceError::Persistence(other),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            ServiceError::InsufficientFunds { .. } => (StatusCode::BAD_REQUEST, "Insufficient coins"),
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            ServiceError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
        };

        if let ServiceError::Persistence(err) = &self {
            tracing::error!("Request failed with persistence error: {}", err);
        }

        let message = match &self {
            ServiceError::Persistence(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "message": message,
        }));

        (status, body).into_response()
    }
}
