//! Deduplication against a real MongoDB.
//!
//! Run with `cargo test -p domain_visitors -- --ignored` (needs Docker).

use domain_visitors::*;
use test_utils::{TestDataBuilder, TestMongo};

fn visitor(builder: &TestDataBuilder) -> VisitorFields {
    VisitorFields {
        first_name: "Ivan".into(),
        last_name: "Petrov".into(),
        phone: builder.phone(),
        email: builder.email("visitor"),
        ..Default::default()
    }
}

async fn registry(mongo: &TestMongo, builder: &TestDataBuilder) -> VisitorRegistry<MongoVisitorRepository> {
    let repository = MongoVisitorRepository::new(&mongo.database(&builder.database_name()));
    repository.create_indexes().await.unwrap();
    VisitorRegistry::new(repository)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_repeat_submission_bumps_counter() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("repeat_submission");
    let registry = registry(&mongo, &builder).await;
    let scope = VisitorScope::Event(builder.name("event", "main"));

    let first = registry
        .register_or_update(VisitorRegistration::new(scope.clone(), visitor(&builder)))
        .await
        .unwrap();
    let second = registry
        .register_or_update(
            VisitorRegistration::new(scope.clone(), visitor(&builder))
                .with_client(None, Some("10.1.1.1".into())),
        )
        .await
        .unwrap();

    assert!(!first.already_registered);
    assert!(second.already_registered);
    assert_eq!(first.visitor.id, second.visitor.id);
    assert_eq!(second.visitor.submits, 2);
    assert_eq!(second.visitor.remote_address.as_deref(), Some("10.1.1.1"));
    assert_eq!(registry.count_in_scope(&scope.key()).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_first_submissions_share_one_record() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("concurrent_first");
    let registry = registry(&mongo, &builder).await;
    let scope = VisitorScope::Event(builder.name("event", "race"));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let registry = registry.clone();
            let registration = VisitorRegistration::new(scope.clone(), visitor(&builder));
            tokio::spawn(async move { registry.register_or_update(registration).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().visitor.id);
    }
    assert_eq!(ids[0], ids[1]);

    let stored = registry.get_visitor(&ids[0]).await.unwrap();
    assert_eq!(stored.submits, 2);
    assert_eq!(registry.count_in_scope(&scope.key()).await.unwrap(), 1);
}
