mod log;
mod memory;
mod smtp;

use async_trait::async_trait;

use crate::error::NotificationError;

/// Result of sending an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub success: bool,
    pub external_id: Option<String>,
    pub error: Option<String>,
}

impl SendResult {
    pub fn delivered(external_id: Option<String>) -> Self {
        Self {
            success: true,
            external_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            external_id: None,
            error: Some(error.into()),
        }
    }
}

/// Rendered email content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    pub subject: Option<String>,
    pub body: String,
    pub html_body: Option<String>,
}

/// Delivers rendered emails.
#[async_trait]
pub trait EmailAdapter: Send + Sync {
    async fn send(
        &self,
        to: &str,
        content: &RenderedContent,
    ) -> Result<SendResult, NotificationError>;

    fn name(&self) -> &'static str;
}

pub use log::LogAdapter;
pub use memory::{MemoryAdapter, SentEmail};
pub use smtp::SmtpAdapter;
