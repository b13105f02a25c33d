use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_code) = match self {
            ApiError::InvalidRequest(e) => (StatusCode::BAD_REQUEST, e, "INVALID_REQUEST"),
            ApiError::NotFound(e) => (StatusCode::NOT_FOUND, e, "NOT_FOUND"),
            ApiError::InternalError(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
            "code": error_code,
        }));

        (status, body).into_response()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
