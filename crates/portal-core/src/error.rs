use thiserror::Error;

/// Core error types for portal operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid record status: {0}")]
    InvalidStatus(String),

    #[error("Invalid admin role: {0}")]
    InvalidRole(String),

    #[error("Invalid audit action: {0}")]
    InvalidAction(String),

    #[error("Invalid DateTime: {0}")]
    InvalidDateTime(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("UUID error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("Invalid file: {message}")]
    InvalidFile { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl CoreError {
    /// Create a new InvalidStatus error
    pub fn invalid_status(status: impl Into<String>) -> Self {
        Self::InvalidStatus(status.into())
    }

    /// Create a new InvalidRole error
    pub fn invalid_role(role: impl Into<String>) -> Self {
        Self::InvalidRole(role.into())
    }

    /// Create a new InvalidAction error
    pub fn invalid_action(action: impl Into<String>) -> Self {
        Self::InvalidAction(action.into())
    }

    /// Create a new InvalidDateTime error
    pub fn invalid_date_time(datetime: impl Into<String>) -> Self {
        Self::InvalidDateTime(datetime.into())
    }

    /// Create a new InvalidFile error
    pub fn invalid_file(message: impl Into<String>) -> Self {
        Self::InvalidFile {
            message: message.into(),
        }
    }

    /// Create a new InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Check if this error can be corrected by the caller (4xx category)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidStatus(_)
                | Self::InvalidRole(_)
                | Self::InvalidAction(_)
                | Self::InvalidDateTime(_)
                | Self::InvalidFile { .. }
                | Self::InvalidInput { .. }
                | Self::JsonError(_)
        )
    }

    /// Check if this error is a server error (5xx category)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::UuidError(_))
    }
}

/// Result type alias for portal operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_status("ARCHIVED");
        assert_eq!(err.to_string(), "Invalid record status: ARCHIVED");

        let err = CoreError::invalid_file("too large");
        assert_eq!(err.to_string(), "Invalid file: too large");
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::invalid_input("missing name").is_client_error());
        assert!(!CoreError::invalid_input("missing name").is_server_error());

        let uuid_err = uuid::Uuid::parse_str("not-a-uuid").unwrap_err();
        let err = CoreError::from(uuid_err);
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
    }
}
