use async_trait::async_trait;

use crate::error::VisitorResult;
use crate::models::{VisitorRecord, VolatileFields};

/// Storage for visitor fingerprints.
///
/// Both write methods must be single atomic operations on the store: two
/// concurrent submissions of the same `(scope, hash)` end up as one record
/// with `submits == 2`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitorRepository: Send + Sync {
    /// Increment `submits` and refresh volatile fields of an existing record.
    /// `None` when no record has this scope and hash.
    async fn record_repeat(
        &self,
        scope: &str,
        hash: &str,
        volatile: VolatileFields,
    ) -> VisitorResult<Option<VisitorRecord>>;

    /// Insert `candidate`, or bump the record that already holds its scope and hash.
    /// The flag is `true` when `candidate` was inserted.
    async fn insert_or_repeat(&self, candidate: VisitorRecord)
    -> VisitorResult<(VisitorRecord, bool)>;

    async fn get_by_id(&self, id: &str) -> VisitorResult<Option<VisitorRecord>>;

    async fn count_by_scope(&self, scope: &str) -> VisitorResult<u64>;
}
