use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that can be returned from handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Caller-facing categories
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown error")]
    Unknown,

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Query build error: {0}")]
    QueryBuild(String),

    // Upstream lookup errors
    #[error("Enrichment error: {0}")]
    Enrichment(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            // 404 Not Found
            AppError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "Not found", Some(resource.clone()))
            }

            // 400 Bad Request
            AppError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "Invalid request",
                Some(msg.clone()),
            ),

            // 500 Internal Server Error
            AppError::Unknown => (StatusCode::INTERNAL_SERVER_ERROR, "Unknown error", None),
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Unknown error", None)
            }
            AppError::QueryBuild(msg) => {
                tracing::error!("Query build error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Unknown error", None)
            }
            AppError::Enrichment(msg) => {
                tracing::error!("Enrichment error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Unknown error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

// Convenient conversions from common error types

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::RecordNotFound(_) => AppError::NotFound("Resource".to_string()),
            sea_orm::DbErr::RecordNotUpdated => AppError::NotFound("Resource".to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<sea_orm::sea_query::error::Error> for AppError {
    fn from(err: sea_orm::sea_query::error::Error) -> Self {
        AppError::QueryBuild(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Enrichment(err.to_string())
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
