//! API errors and their `{code, message}` response form.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use portal_core::CoreError;
use portal_storage::StorageError;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Rejected input. `code` is one of the client error codes such as
    /// `VALIDATION_FAILED`, `EMAIL_EXISTS`, `PHONE_EXISTS` or `INVALID_FILE`.
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("Invalid type: {0}")]
    InvalidType(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: "VALIDATION_FAILED",
            message: message.into(),
        }
    }
    pub fn email_exists() -> Self {
        Self::BadRequest {
            code: "EMAIL_EXISTS",
            message: "Email already exists".into(),
        }
    }
    pub fn phone_exists() -> Self {
        Self::BadRequest {
            code: "PHONE_EXISTS",
            message: "Phone number already exists".into(),
        }
    }
    pub fn invalid_file(message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: "INVALID_FILE",
            message: message.into(),
        }
    }
    pub fn invalid_type(kind: impl Into<String>) -> Self {
        Self::InvalidType(kind.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } | Self::InvalidType(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. } => code,
            Self::InvalidType(_) => "INVALID_TYPE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "SERVER_ERROR",
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => {
                Self::not_found(format!("{entity} {id} not found"))
            }
            StorageError::UnknownEntity { kind } => Self::invalid_type(kind),
            StorageError::InvalidQuery { message } => Self::validation(message),
            err => Self::internal(format!("{} storage error: {err}", err.category())),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidFile { message } => Self::invalid_file(message),
            err if err.is_client_error() => Self::validation(err.to_string()),
            err => Self::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::BadRequest { message, .. } => message.clone(),
            Self::InvalidType(kind) => format!("Invalid type '{kind}'"),
            Self::NotFound(message) => message.clone(),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "code": self.code(), "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_mapping() {
        let err = ApiError::from(StorageError::unknown_entity("news"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INVALID_TYPE");

        let err = ApiError::from(StorageError::invalid_query("Unknown filter field 'x'"));
        assert_eq!(err.code(), "VALIDATION_FAILED");
        assert!(matches!(
            err,
            ApiError::BadRequest { ref message, .. } if message.starts_with("Unknown")
        ));

        let err = ApiError::from(StorageError::not_found("Collaborator", "c1"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = ApiError::from(StorageError::unavailable("down"));
        assert_eq!(err.code(), "SERVER_ERROR");
        assert!(matches!(
            err,
            ApiError::Internal(ref detail) if detail.starts_with("infrastructure")
        ));

        let err = ApiError::from(StorageError::already_exists("media", "m1"));
        assert!(matches!(err, ApiError::Internal(ref detail) if detail.starts_with("conflict")));
    }

    #[test]
    fn test_core_error_mapping() {
        let err = ApiError::from(CoreError::invalid_file("File too large"));
        assert_eq!(err.code(), "INVALID_FILE");
        assert!(matches!(
            err,
            ApiError::BadRequest { ref message, .. } if message == "File too large"
        ));
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let response = ApiError::internal("connection refused").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
