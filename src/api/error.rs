use crate::blockchain::IndexerError;
use crate::db::StoreError;
use crate::validation::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid address format")]
    InvalidAddress,

    #[error("A run is already in progress")]
    Conflict,

    #[error("Run timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Indexing failed: {0}")]
    Indexer(#[from] IndexerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InvalidAddress => (
                StatusCode::BAD_REQUEST,
                "Invalid blockchain address format".to_string(),
            ),
            ApiError::Conflict => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Timeout(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            ApiError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error occurred".to_string(),
            ),
            ApiError::Indexer(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidSolanaAddress(_) => ApiError::InvalidAddress,
            ValidationError::MissingParameter(param) => {
                ApiError::BadRequest(format!("Missing parameter: {}", param))
            }
        }
    }
}
