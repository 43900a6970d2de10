//! MongoDB implementation of MailRepository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::doc,
};
use tracing::instrument;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{MailStatus, TemplateMailRecord};
use crate::repository::MailRepository;

pub const COLLECTION: &str = "sent-mails";

pub struct MongoMailRepository {
    collection: Collection<TemplateMailRecord>,
}

impl MongoMailRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<TemplateMailRecord>(collection_name),
        }
    }

    pub async fn create_indexes(&self) -> NotificationResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "status": 1, "_id": 1 })
                .build(),
        ];
        self.collection.create_indexes(indexes).await?;
        Ok(())
    }
}

#[async_trait]
impl MailRepository for MongoMailRepository {
    #[instrument(skip(self, record), fields(id = %record.id, template = %record.template_name))]
    async fn insert(&self, record: TemplateMailRecord) -> NotificationResult<TemplateMailRecord> {
        self.collection.insert_one(&record).await?;
        Ok(record)
    }

    /// Oldest first. Ids are UUID v7, so `_id` order is creation order.
    #[instrument(skip(self))]
    async fn find_pending(&self) -> NotificationResult<Vec<TemplateMailRecord>> {
        let cursor = self
            .collection
            .find(doc! { "status": MailStatus::Pending.as_ref() })
            .sort(doc! { "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self, record), fields(id = %record.id, status = %record.status))]
    async fn save(&self, record: &TemplateMailRecord) -> NotificationResult<()> {
        let result = self
            .collection
            .replace_one(doc! { "_id": &record.id }, record)
            .await?;
        if result.matched_count == 0 {
            return Err(NotificationError::Database(format!(
                "mail {} not found",
                record.id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> NotificationResult<Option<TemplateMailRecord>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }
}
