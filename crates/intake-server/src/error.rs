//! API error contract.
//!
//! All error responses share one JSON schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "file is empty" } }
//! ```
//!
//! Codes: `bad_request` (400), `unauthorized` (401), `forbidden` (403),
//! `not_found` (404), `invalid_record` (422), `internal` (500).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use intake_core::{ExtractionError, IntakeError};

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Request-level error that converts into an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Constructs a 400 Bad Request error.
pub fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "bad_request", message)
}

/// Constructs a 401 Unauthorized error.
pub fn unauthorized(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// Constructs a 403 Forbidden error.
pub fn forbidden(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Constructs a 404 Not Found error.
pub fn not_found(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not_found", message)
}

/// Constructs a 422 error for malformed record input.
pub fn invalid_record(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_record", message)
}

/// Constructs a 500 Internal Server Error.
pub fn internal(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        internal(format!("database error: {err}"))
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Extraction(e) => e.into(),
            other => internal(other.to_string()),
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        invalid_record(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_maps_to_422() {
        let err: ApiError = ExtractionError::InvalidRecord("not a map".to_string()).into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, "invalid_record");
    }

    #[test]
    fn test_helper_status_codes() {
        assert_eq!(bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(unauthorized("x").status, StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden("x").status, StatusCode::FORBIDDEN);
        assert_eq!(not_found("x").status, StatusCode::NOT_FOUND);
        assert_eq!(internal("x").status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
