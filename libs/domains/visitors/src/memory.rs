//! In-memory VisitorRepository for tests and local runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::VisitorResult;
use crate::models::{VisitorRecord, VolatileFields};
use crate::repository::VisitorRepository;

#[derive(Debug, Default, Clone)]
pub struct InMemoryVisitorRepository {
    /// keyed by `(scope, hash)`
    visitors: Arc<RwLock<HashMap<(String, String), VisitorRecord>>>,
}

impl InMemoryVisitorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bump(record: &mut VisitorRecord, volatile: VolatileFields) {
    record.submits += 1;
    if volatile.source_type.is_some() {
        record.source_type = volatile.source_type;
    }
    if volatile.source_data.is_some() {
        record.source_data = volatile.source_data;
    }
    record.ua_info = volatile.ua_info;
    record.remote_address = volatile.remote_address;
    record.updated_at = volatile.updated_at;
}

#[async_trait]
impl VisitorRepository for InMemoryVisitorRepository {
    async fn record_repeat(
        &self,
        scope: &str,
        hash: &str,
        volatile: VolatileFields,
    ) -> VisitorResult<Option<VisitorRecord>> {
        let mut visitors = self.visitors.write().await;
        Ok(visitors
            .get_mut(&(scope.to_string(), hash.to_string()))
            .map(|record| {
                bump(record, volatile);
                record.clone()
            }))
    }

    async fn insert_or_repeat(
        &self,
        candidate: VisitorRecord,
    ) -> VisitorResult<(VisitorRecord, bool)> {
        let mut visitors = self.visitors.write().await;
        let key = (candidate.scope.clone(), candidate.hash.clone());

        match visitors.get_mut(&key) {
            Some(existing) => {
                bump(existing, VolatileFields::from(&candidate));
                Ok((existing.clone(), false))
            }
            None => {
                visitors.insert(key, candidate.clone());
                Ok((candidate, true))
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> VisitorResult<Option<VisitorRecord>> {
        let visitors = self.visitors.read().await;
        Ok(visitors.values().find(|v| v.id == id).cloned())
    }

    async fn count_by_scope(&self, scope: &str) -> VisitorResult<u64> {
        let visitors = self.visitors.read().await;
        Ok(visitors.keys().filter(|(s, _)| s == scope).count() as u64)
    }
}
