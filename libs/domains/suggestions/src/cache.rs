//! Suggestion cache: one Mongo collection per name part and gender.

use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    Collection, Database,
    bson::{doc, to_bson},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::SuggestionResult;
use crate::models::{CacheKey, FioSuggestion};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SuggestionCache: Send + Sync {
    /// Cached suggestions for `key`. A hit increments the record's hit counter.
    async fn lookup(&self, key: &CacheKey) -> SuggestionResult<Option<Vec<FioSuggestion>>>;

    /// Replaces the record for `key` and resets its hit counter.
    async fn store(&self, key: &CacheKey, suggestions: &[FioSuggestion]) -> SuggestionResult<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub q: String,
    /// Unix milliseconds of the last store.
    pub timestamp: i64,
    pub hit_count: i64,
    pub data: Vec<FioSuggestion>,
}

pub struct MongoSuggestionCache {
    db: Database,
}

impl MongoSuggestionCache {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    fn collection(&self, key: &CacheKey) -> Collection<CacheRecord> {
        self.db.collection::<CacheRecord>(&key.collection)
    }
}

#[async_trait]
impl SuggestionCache for MongoSuggestionCache {
    #[instrument(skip(self), fields(collection = %key.collection))]
    async fn lookup(&self, key: &CacheKey) -> SuggestionResult<Option<Vec<FioSuggestion>>> {
        let record = self
            .collection(key)
            .find_one_and_update(doc! { "q": &key.query }, doc! { "$inc": { "hitCount": 1 } })
            .await?;
        Ok(record.map(|r| r.data))
    }

    #[instrument(skip(self, suggestions), fields(collection = %key.collection, count = suggestions.len()))]
    async fn store(&self, key: &CacheKey, suggestions: &[FioSuggestion]) -> SuggestionResult<()> {
        let update = doc! {
            "$set": {
                "q": &key.query,
                "hitCount": 1_i64,
                "timestamp": Utc::now().timestamp_millis(),
                "data": to_bson(suggestions)?,
            }
        };
        self.collection(key)
            .update_one(doc! { "q": &key.query }, update)
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemorySuggestionCache {
    records: Arc<RwLock<HashMap<CacheKey, CacheRecord>>>,
}

impl InMemorySuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, key: &CacheKey) -> Option<CacheRecord> {
        self.records.read().await.get(key).cloned()
    }
}

#[async_trait]
impl SuggestionCache for InMemorySuggestionCache {
    async fn lookup(&self, key: &CacheKey) -> SuggestionResult<Option<Vec<FioSuggestion>>> {
        let mut records = self.records.write().await;
        Ok(records.get_mut(key).map(|record| {
            record.hit_count += 1;
            record.data.clone()
        }))
    }

    async fn store(&self, key: &CacheKey, suggestions: &[FioSuggestion]) -> SuggestionResult<()> {
        self.records.write().await.insert(
            key.clone(),
            CacheRecord {
                q: key.query.clone(),
                timestamp: Utc::now().timestamp_millis(),
                hit_count: 1,
                data: suggestions.to_vec(),
            },
        );
        Ok(())
    }
}
