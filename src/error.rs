use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ShortstackError {
    #[error("Unsupported request shape: {0}")]
    UnsupportedRequestShape(String),

    #[error("Search data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Invalid index bundle: {0}")]
    InvalidBundle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Tantivy error: {0}")]
    Tantivy(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ShortstackError>;

impl From<std::io::Error> for ShortstackError {
    fn from(e: std::io::Error) -> Self {
        ShortstackError::Io(e.to_string())
    }
}

impl From<tantivy::TantivyError> for ShortstackError {
    fn from(e: tantivy::TantivyError) -> Self {
        ShortstackError::Tantivy(e.to_string())
    }
}

impl From<serde_json::Error> for ShortstackError {
    fn from(e: serde_json::Error) -> Self {
        ShortstackError::Json(e.to_string())
    }
}

impl From<reqwest::Error> for ShortstackError {
    fn from(e: reqwest::Error) -> Self {
        ShortstackError::Http(e.to_string())
    }
}

impl ShortstackError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ShortstackError::UnsupportedRequestShape(_) => StatusCode::BAD_REQUEST,
            ShortstackError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ShortstackError::IndexNotFound(_) => StatusCode::NOT_FOUND,
            ShortstackError::InvalidBundle(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ShortstackError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ShortstackError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ShortstackError::Http(_) => StatusCode::BAD_GATEWAY,
            ShortstackError::Json(_) => StatusCode::BAD_REQUEST,
            ShortstackError::Tantivy(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ShortstackError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ShortstackError::UnsupportedRequestShape(_) => "unsupported_request_shape",
            ShortstackError::DataUnavailable(_) => "data_unavailable",
            ShortstackError::IndexNotFound(_) => "index_not_found",
            ShortstackError::InvalidBundle(_) => "invalid_bundle",
            ShortstackError::Config(_) => "config_error",
            ShortstackError::Io(_) => "io_error",
            ShortstackError::Http(_) => "upstream_error",
            ShortstackError::Json(_) => "json_error",
            ShortstackError::Tantivy(_) => "internal_error",
            ShortstackError::Internal(_) => "internal_error",
        }
    }
}

// Axum IntoResponse implementation (feature-gated)
#[cfg(feature = "axum-support")]
use axum::response::{IntoResponse, Json, Response};
#[cfg(feature = "axum-support")]
use serde::Serialize;

#[cfg(feature = "axum-support")]
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub request_id: String,
}

#[cfg(feature = "axum-support")]
impl IntoResponse for ShortstackError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            request_id: format!("req_ss_{}", uuid::Uuid::new_v4()),
        };
        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape_is_client_error() {
        let err = ShortstackError::UnsupportedRequestShape("expected an array".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Unsupported request shape: expected an array"
        );
    }

    #[test]
    fn test_data_unavailable_is_retryable_status() {
        let err = ShortstackError::DataUnavailable("search_index.json".into());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
