//! Authentication errors and their HTTP form.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Errors raised while verifying a session.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No session was presented, or it lacks the required role.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The session token failed verification.
    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Session expired")]
    TokenExpired,

    /// Signing or key setup failed.
    #[error("Internal auth error: {message}")]
    Internal { message: String },
}

impl AuthError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidKeyFormat => Self::internal(err.to_string()),
            _ => Self::invalid_token(err.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            Self::Internal { .. } => {
                tracing::error!(error = %self, "authentication failed internally");
                ("SERVER_ERROR", "Internal server error".to_string())
            }
            Self::TokenExpired => ("UNAUTHORIZED", "Session expired".to_string()),
            Self::Unauthorized { message } | Self::InvalidToken { message } => {
                ("UNAUTHORIZED", message.clone())
            }
        };

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        (status, headers, Json(json!({ "code": code, "message": message }))).into_response()
    }
}
