//! Mail transports.

mod memory;
mod smtp;

pub use memory::InMemoryTransport;
pub use smtp::SmtpTransport;

use crate::error::NotificationResult;
use crate::models::{OutgoingMail, SendReceipt};
use async_trait::async_trait;

/// Delivers a fully rendered mail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> NotificationResult<SendReceipt>;

    fn name(&self) -> &'static str;

    /// Checks that the server accepts connections.
    async fn verify(&self) -> NotificationResult<bool>;
}
