//! Registration with fingerprint deduplication

use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{VisitorError, VisitorResult};
use crate::fingerprint::{canonical_source, fingerprint};
use crate::models::{RegistrationOutcome, VisitorRecord, VisitorRegistration, VolatileFields};
use crate::repository::VisitorRepository;

/// Turns repeated submissions of the same form into one visitor with a submit counter.
pub struct VisitorRegistry<R: VisitorRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: VisitorRepository + ?Sized> Clone for VisitorRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: VisitorRepository + ?Sized> VisitorRegistry<R> {
    pub fn new(repository: R) -> Self
    where
        R: Sized,
    {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub fn from_arc(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, registration), fields(scope = %registration.scope))]
    pub async fn register_or_update(
        &self,
        registration: VisitorRegistration,
    ) -> VisitorResult<RegistrationOutcome> {
        let with_optional = registration.scope.hashes_optional_fields();
        let hash = fingerprint(&registration.fields, with_optional);
        let scope = registration.scope.key();

        tracing::debug!(
            source = %canonical_source(&registration.fields, with_optional),
            %hash,
            "Visitor fingerprint"
        );

        if let Some(visitor) = self
            .repository
            .record_repeat(&scope, &hash, VolatileFields::from(&registration))
            .await?
        {
            info!(visitor_id = %visitor.id, submits = visitor.submits, "Repeated registration");
            return Ok(RegistrationOutcome {
                visitor,
                already_registered: true,
            });
        }

        let candidate = VisitorRecord::first_submission(registration, hash);
        let (visitor, inserted) = self.repository.insert_or_repeat(candidate).await?;

        info!(
            visitor_id = %visitor.id,
            submits = visitor.submits,
            is_new = inserted,
            "Visitor registered"
        );
        Ok(RegistrationOutcome {
            visitor,
            already_registered: !inserted,
        })
    }

    pub async fn get_visitor(&self, id: &str) -> VisitorResult<VisitorRecord> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| VisitorError::NotFound(id.to_string()))
    }

    pub async fn count_in_scope(&self, scope: &str) -> VisitorResult<u64> {
        self.repository.count_by_scope(scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryVisitorRepository;
    use crate::models::{Gender, SourceType, VisitorFields, VisitorScope};
    use crate::repository::MockVisitorRepository;
    use crate::user_agent::UserAgentInfo;

    fn ivan() -> VisitorFields {
        VisitorFields {
            first_name: "Ivan".into(),
            last_name: "Petrov".into(),
            company_name: "Acme".into(),
            position: "CEO".into(),
            phone: "+7123".into(),
            email: "i@x.co".into(),
            ..Default::default()
        }
    }

    fn at_event(event_id: &str, fields: VisitorFields) -> VisitorRegistration {
        VisitorRegistration::new(VisitorScope::Event(event_id.into()), fields)
    }

    #[tokio::test]
    async fn test_second_identical_submission_is_a_repeat() {
        let registry = VisitorRegistry::new(InMemoryVisitorRepository::new());

        let first = registry.register_or_update(at_event("E1", ivan())).await.unwrap();
        assert!(!first.already_registered);
        assert_eq!(first.visitor.submits, 1);

        let second = registry
            .register_or_update(at_event("E1", ivan()).with_client(
                UserAgentInfo::parse("Mozilla/5.0 (X11; Linux x86_64) Firefox/120.0"),
                Some("10.0.0.2".into()),
            ))
            .await
            .unwrap();
        assert!(second.already_registered);
        assert_eq!(second.visitor.id, first.visitor.id);
        assert_eq!(second.visitor.submits, 2);
        assert_eq!(second.visitor.remote_address.as_deref(), Some("10.0.0.2"));
        assert!(second.visitor.ua_info.is_some());
    }

    #[tokio::test]
    async fn test_repeat_refreshes_source_when_given() {
        let registry = VisitorRegistry::new(InMemoryVisitorRepository::new());

        registry
            .register_or_update(
                at_event("E1", ivan()).with_source(Some(SourceType::Widget), Some(serde_json::json!({ "ref": "a" }))),
            )
            .await
            .unwrap();

        let moved = registry
            .register_or_update(
                at_event("E1", ivan()).with_source(Some(SourceType::External), Some(serde_json::json!({ "ref": "b" }))),
            )
            .await
            .unwrap();
        assert_eq!(moved.visitor.source_type, Some(SourceType::External));
        assert_eq!(moved.visitor.source_data, Some(serde_json::json!({ "ref": "b" })));

        let bare = registry.register_or_update(at_event("E1", ivan())).await.unwrap();
        assert_eq!(bare.visitor.submits, 3);
        assert_eq!(bare.visitor.source_type, Some(SourceType::External));
    }

    #[tokio::test]
    async fn test_different_phone_is_a_different_visitor() {
        let registry = VisitorRegistry::new(InMemoryVisitorRepository::new());
        let a = registry.register_or_update(at_event("E1", ivan())).await.unwrap();
        let b = registry
            .register_or_update(at_event(
                "E1",
                VisitorFields {
                    phone: "+7999".into(),
                    ..ivan()
                },
            ))
            .await
            .unwrap();

        assert_ne!(a.visitor.id, b.visitor.id);
        assert!(!b.already_registered);
        assert_eq!(registry.count_in_scope("event:E1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let registry = VisitorRegistry::new(InMemoryVisitorRepository::new());
        let e1 = registry.register_or_update(at_event("E1", ivan())).await.unwrap();
        let e2 = registry.register_or_update(at_event("E2", ivan())).await.unwrap();
        let ft = registry
            .register_or_update(VisitorRegistration::new(VisitorScope::FastTrack, ivan()))
            .await
            .unwrap();

        assert_ne!(e1.visitor.id, e2.visitor.id);
        assert_ne!(e2.visitor.id, ft.visitor.id);
        assert!(!e2.already_registered && !ft.already_registered);
    }

    #[tokio::test]
    async fn test_fast_track_ignores_gender() {
        let registry = VisitorRegistry::new(InMemoryVisitorRepository::new());
        registry
            .register_or_update(VisitorRegistration::new(VisitorScope::FastTrack, ivan()))
            .await
            .unwrap();
        let again = registry
            .register_or_update(VisitorRegistration::new(
                VisitorScope::FastTrack,
                VisitorFields {
                    gender: Some(Gender::Male),
                    ..ivan()
                },
            ))
            .await
            .unwrap();
        assert!(again.already_registered);
    }

    #[tokio::test]
    async fn test_concurrent_first_submissions_create_one_record() {
        let registry = VisitorRegistry::new(InMemoryVisitorRepository::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.register_or_update(at_event("E1", ivan())).await })
            })
            .collect();

        let mut ids = Vec::new();
        let mut new_records = 0;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            if !outcome.already_registered {
                new_records += 1;
            }
            ids.push(outcome.visitor.id);
        }

        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(new_records, 1);
        assert_eq!(registry.get_visitor(&ids[0]).await.unwrap().submits, 8);
    }

    #[tokio::test]
    async fn test_lost_race_reports_already_registered() {
        let mut repo = MockVisitorRepository::new();
        repo.expect_record_repeat().times(1).returning(|_, _, _| Ok(None));
        repo.expect_insert_or_repeat().times(1).returning(|candidate| {
            let winner = VisitorRecord {
                id: "winner".into(),
                submits: 2,
                ..candidate
            };
            Ok((winner, false))
        });

        let outcome = VisitorRegistry::new(repo)
            .register_or_update(at_event("E1", ivan()))
            .await
            .unwrap();
        assert!(outcome.already_registered);
        assert_eq!(outcome.visitor.id, "winner");
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut repo = MockVisitorRepository::new();
        repo.expect_record_repeat()
            .returning(|_, _, _| Err(VisitorError::Database("connection reset".into())));
        repo.expect_insert_or_repeat().never();

        let err = VisitorRegistry::new(repo)
            .register_or_update(at_event("E1", ivan()))
            .await
            .unwrap_err();
        assert!(matches!(err, VisitorError::Database(_)));
    }

    #[tokio::test]
    async fn test_unknown_visitor_is_not_found() {
        let registry = VisitorRegistry::new(InMemoryVisitorRepository::new());
        assert!(matches!(
            registry.get_visitor("missing").await,
            Err(VisitorError::NotFound(_))
        ));
    }
}
