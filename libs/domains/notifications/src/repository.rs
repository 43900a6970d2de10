use async_trait::async_trait;

use crate::error::NotificationResult;
use crate::models::TemplateMailRecord;

/// Outbox storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailRepository: Send + Sync {
    async fn insert(&self, record: TemplateMailRecord) -> NotificationResult<TemplateMailRecord>;

    /// Pending records, oldest first.
    async fn find_pending(&self) -> NotificationResult<Vec<TemplateMailRecord>>;

    /// Replace the stored record with the same id.
    async fn save(&self, record: &TemplateMailRecord) -> NotificationResult<()>;

    async fn get_by_id(&self, id: &str) -> NotificationResult<Option<TemplateMailRecord>>;
}
