//! MongoDB implementation of VisitorRepository

use async_trait::async_trait;
use database::DatabaseError;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc, to_bson, to_document},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
};
use tracing::{instrument, warn};

use crate::error::{VisitorError, VisitorResult};
use crate::models::{VisitorRecord, VolatileFields};
use crate::repository::VisitorRepository;

pub const COLLECTION: &str = "visitors";

/// Keys owned by `$inc`/`$set`, kept out of `$setOnInsert`
const VOLATILE_KEYS: [&str; 6] = [
    "submits",
    "sourceType",
    "sourceData",
    "uaInfo",
    "remoteAddress",
    "updatedAt",
];

pub struct MongoVisitorRepository {
    collection: Collection<VisitorRecord>,
}

impl MongoVisitorRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<VisitorRecord>(COLLECTION),
        }
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<VisitorRecord>(collection_name),
        }
    }

    /// The unique `(scope, hash)` index is what makes concurrent first submissions safe.
    pub async fn create_indexes(&self) -> VisitorResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "scope": 1, "hash": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("scope_hash_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder().keys(doc! { "info.email": 1 }).build(),
        ];

        self.collection.create_indexes(indexes).await?;
        Ok(())
    }

    fn volatile_set(volatile: &VolatileFields) -> VisitorResult<Document> {
        let mut set = doc! {
            "uaInfo": to_bson(&volatile.ua_info)?,
            "remoteAddress": to_bson(&volatile.remote_address)?,
            "updatedAt": to_bson(&volatile.updated_at)?,
        };
        if let Some(source_type) = &volatile.source_type {
            set.insert("sourceType", to_bson(source_type)?);
        }
        if let Some(source_data) = &volatile.source_data {
            set.insert("sourceData", to_bson(source_data)?);
        }
        Ok(set)
    }

    fn after_update() -> FindOneAndUpdateOptions {
        FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build()
    }

    async fn upsert_once(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<Option<VisitorRecord>, mongodb::error::Error> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(filter, update)
            .with_options(options)
            .await
    }
}

#[async_trait]
impl VisitorRepository for MongoVisitorRepository {
    #[instrument(skip(self, volatile))]
    async fn record_repeat(
        &self,
        scope: &str,
        hash: &str,
        volatile: VolatileFields,
    ) -> VisitorResult<Option<VisitorRecord>> {
        let update = doc! {
            "$inc": { "submits": 1_i64 },
            "$set": Self::volatile_set(&volatile)?,
        };

        let record = self
            .collection
            .find_one_and_update(doc! { "scope": scope, "hash": hash }, update)
            .with_options(Self::after_update())
            .await?;
        Ok(record)
    }

    #[instrument(skip(self, candidate), fields(scope = %candidate.scope, hash = %candidate.hash))]
    async fn insert_or_repeat(
        &self,
        candidate: VisitorRecord,
    ) -> VisitorResult<(VisitorRecord, bool)> {
        let filter = doc! { "scope": &candidate.scope, "hash": &candidate.hash };

        let mut on_insert = to_document(&candidate)?;
        for key in VOLATILE_KEYS {
            on_insert.remove(key);
        }
        let volatile = VolatileFields::from(&candidate);
        let update = doc! {
            "$setOnInsert": on_insert,
            "$inc": { "submits": 1_i64 },
            "$set": Self::volatile_set(&volatile)?,
        };

        // Two racing upserts can both miss and then collide on the unique index.
        // The loser's retry finds the winner's record and bumps it.
        let record = match self.upsert_once(filter.clone(), update.clone()).await {
            Err(e) if DatabaseError::is_duplicate_key(&e) => {
                warn!("Concurrent first submission, retrying as repeat");
                self.upsert_once(filter, update).await?
            }
            other => other?,
        };

        let record = record.ok_or_else(|| {
            VisitorError::Internal("visitor upsert returned no document".to_string())
        })?;
        let inserted = record.id == candidate.id;
        Ok((record, inserted))
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> VisitorResult<Option<VisitorRecord>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self))]
    async fn count_by_scope(&self, scope: &str) -> VisitorResult<u64> {
        Ok(self.collection.count_documents(doc! { "scope": scope }).await?)
    }
}
