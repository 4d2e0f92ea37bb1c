use async_trait::async_trait;

use super::{EmailAdapter, RenderedContent, SendResult};
use crate::error::NotificationError;

/// Logs emails instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAdapter;

#[async_trait]
impl EmailAdapter for LogAdapter {
    async fn send(
        &self,
        to: &str,
        content: &RenderedContent,
    ) -> Result<SendResult, NotificationError> {
        tracing::info!(
            to = %to,
            subject = content.subject.as_deref().unwrap_or_default(),
            "email delivery disabled, message not sent"
        );
        tracing::debug!(body = %content.body, "suppressed email body");
        Ok(SendResult::delivered(None))
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
