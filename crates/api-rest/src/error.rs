//! API error type and its mapping from core failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use medrec_core::{DirectoryError, SinkError, StartCallError};
use serde::Serialize;
use utoipa::ToSchema;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body returned to callers.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
    pub code: String,
}

/// API error with HTTP status code.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    /// 400 Bad Request
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "VALIDATION_ERROR")
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    /// 500, missing configuration
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "CONFIGURATION_ERROR",
        )
    }

    /// 500, directory store failure
    pub fn external_store(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "EXTERNAL_STORE_ERROR",
        )
    }

    /// 502, webhook sink could not be reached
    pub fn sink_unreachable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message, "SINK_UNREACHABLE")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] [{}] {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        Self::external_store(err.to_string())
    }
}

impl From<SinkError> for ApiError {
    fn from(err: SinkError) -> Self {
        Self::sink_unreachable(err.to_string())
    }
}

impl From<StartCallError> for ApiError {
    fn from(err: StartCallError) -> Self {
        match err {
            StartCallError::Configuration(msg) => Self::configuration(msg),
            StartCallError::NotFound(msg) => Self::not_found(msg),
            StartCallError::Validation(msg) => Self::validation(msg),
            StartCallError::Directory(e) => e.into(),
            StartCallError::Sink(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = self.code, "{}", self.message);
        } else {
            tracing::warn!(status = %self.status, code = self.code, "{}", self.message);
        }

        let body = Json(ErrorBody {
            detail: self.message,
            code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_call_errors_map_to_statuses() {
        let cases = [
            (
                StartCallError::Configuration("unset".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
            ),
            (
                StartCallError::NotFound("missing".into()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                StartCallError::Validation("no phone".into()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                StartCallError::Directory(DirectoryError::NotConfigured("no key".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "EXTERNAL_STORE_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, status);
            assert_eq!(api.code, code);
        }
    }

    #[test]
    fn cause_is_kept_in_message() {
        let api: ApiError = StartCallError::Directory(DirectoryError::Status {
            status: 401,
            body: "AUTHENTICATION_REQUIRED".into(),
        })
        .into();
        assert!(api.message.contains("401"));
        assert!(api.message.contains("AUTHENTICATION_REQUIRED"));
    }

    #[test]
    fn display_includes_code() {
        let display = ApiError::not_found("Patient P1 not found").to_string();
        assert!(display.contains("NOT_FOUND"));
        assert!(display.contains("P1"));
    }

    #[test]
    fn into_response_uses_status() {
        let response = ApiError::validation("bad").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
