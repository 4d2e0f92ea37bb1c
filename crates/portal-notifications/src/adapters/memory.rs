use async_trait::async_trait;
use parking_lot::Mutex;

use super::{EmailAdapter, RenderedContent, SendResult};
use crate::error::NotificationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub content: RenderedContent,
}

/// Records emails in memory.
///
/// A failing adapter rejects every message, which lets callers check that
/// delivery problems stay out of the request path.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    sent: Mutex<Vec<SentEmail>>,
    failing: bool,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl EmailAdapter for MemoryAdapter {
    async fn send(
        &self,
        to: &str,
        content: &RenderedContent,
    ) -> Result<SendResult, NotificationError> {
        if self.failing {
            return Err(NotificationError::SendFailed("mailbox unavailable".into()));
        }
        self.sent.lock().push(SentEmail {
            to: to.to_string(),
            content: content.clone(),
        });
        Ok(SendResult::delivered(None))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
