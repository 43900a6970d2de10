//! In-memory MailRepository for tests and local runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{NotificationError, NotificationResult};
use crate::models::TemplateMailRecord;
use crate::repository::MailRepository;

#[derive(Debug, Default, Clone)]
pub struct InMemoryMailRepository {
    mails: Arc<RwLock<HashMap<String, TemplateMailRecord>>>,
}

impl InMemoryMailRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<TemplateMailRecord> {
        let mut all: Vec<_> = self.mails.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

#[async_trait]
impl MailRepository for InMemoryMailRepository {
    async fn insert(&self, record: TemplateMailRecord) -> NotificationResult<TemplateMailRecord> {
        let mut mails = self.mails.write().await;
        if mails.contains_key(&record.id) {
            return Err(NotificationError::Database(format!(
                "duplicate mail id {}",
                record.id
            )));
        }
        mails.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_pending(&self) -> NotificationResult<Vec<TemplateMailRecord>> {
        Ok(self
            .all()
            .await
            .into_iter()
            .filter(TemplateMailRecord::is_pending)
            .collect())
    }

    async fn save(&self, record: &TemplateMailRecord) -> NotificationResult<()> {
        let mut mails = self.mails.write().await;
        match mails.get_mut(&record.id) {
            Some(stored) => {
                *stored = record.clone();
                Ok(())
            }
            None => Err(NotificationError::Database(format!(
                "mail {} not found",
                record.id
            ))),
        }
    }

    async fn get_by_id(&self, id: &str) -> NotificationResult<Option<TemplateMailRecord>> {
        Ok(self.mails.read().await.get(id).cloned())
    }
}
