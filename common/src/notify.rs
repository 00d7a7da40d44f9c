//! Outbound notification seam shared by the poller and the chat channels.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Не удалось отправить сообщение: {reason}")]
pub struct NotifyError {
    pub reason: String,
}

impl NotifyError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Delivers a text message to a single, fixed destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}
