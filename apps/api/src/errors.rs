use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::fetcher::FetchError;

/// A single rejected request field, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {}", field_names(.0))]
    InvalidInput(Vec<FieldError>),

    #[error("Unknown cover letter style '{0}'")]
    UnknownStyle(String),

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Failed to fetch job posting: {0}")]
    FetchFailed(String),

    #[error("Timed out fetching job posting: {0}")]
    FetchTimeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        AppError::InvalidInput(vec![FieldError::new(field, message)])
    }

    /// Stable machine-readable kind, echoed as `error.code`.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::UnknownStyle(_) => "UNKNOWN_STYLE",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::FetchFailed(_) => "FETCH_FAILED",
            AppError::FetchTimeout(_) => "FETCH_TIMEOUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::UnknownStyle(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::FetchFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidUrl(msg) => AppError::invalid("url", msg),
            FetchError::Timeout { .. } => AppError::FetchTimeout(err.to_string()),
            FetchError::Upstream { .. } => AppError::FetchFailed(err.to_string()),
        }
    }
}

fn field_names(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let error = match &self {
            AppError::InvalidInput(fields) => json!({
                "code": code,
                "message": self.to_string(),
                "fields": fields,
            }),
            AppError::RateLimited { retry_after_secs } => json!({
                "code": code,
                "message": self.to_string(),
                "retry_after_secs": retry_after_secs,
            }),
            AppError::FetchFailed(msg) | AppError::FetchTimeout(msg) => {
                tracing::warn!("Upstream fetch error: {msg}");
                json!({ "code": code, "message": self.to_string() })
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                json!({ "code": code, "message": "A storage error occurred" })
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                json!({ "code": code, "message": "An internal server error occurred" })
            }
            _ => json!({ "code": code, "message": self.to_string() }),
        };

        let mut response = (status, Json(json!({ "error": error }))).into_response();

        if let AppError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
