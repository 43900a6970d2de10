use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::MailTransport;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{OutgoingMail, SendReceipt};

/// Keeps sent mail in memory. Can be switched into a failing mode.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransport {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following send fails with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(|p| p.into_inner()) = Some(message.into());
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl MailTransport for InMemoryTransport {
    async fn send(&self, mail: &OutgoingMail) -> NotificationResult<SendReceipt> {
        if let Some(message) = self.failure.lock().unwrap_or_else(|p| p.into_inner()).clone() {
            return Err(NotificationError::Transport(message));
        }

        let mut sent = self.sent.lock().unwrap_or_else(|p| p.into_inner());
        sent.push(mail.clone());
        Ok(SendReceipt {
            message_id: mail.message_id.clone(),
            response: format!("250 queued as {}", sent.len()),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn verify(&self) -> NotificationResult<bool> {
        Ok(true)
    }
}
