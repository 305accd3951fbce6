//! Shared tests for AuditRepo implementations

use chrono::{DateTime, Duration, Utc};

use super::fixtures::now;
use crate::{
    db::repos::AuditRepo,
    models::{CreateAuditEntry, DeletedEntity, Qualifier},
};

fn deleted(uuid: &str, qualifier: Qualifier) -> DeletedEntity {
    DeletedEntity {
        uuid: uuid.to_string(),
        key: format!("org.example:{uuid}"),
        name: format!("Component {uuid}"),
        qualifier,
    }
}

fn deletion(uuid: &str, qualifier: Qualifier, at: DateTime<Utc>) -> CreateAuditEntry {
    CreateAuditEntry::component_deleted(&deleted(uuid, qualifier), at)
}

pub async fn test_create_records_deletion(repo: &dyn AuditRepo) {
    let entry = repo
        .create(deletion("p1", Qualifier::Project, now()))
        .await
        .expect("Failed to create audit entry");

    assert!(!entry.uuid.is_empty());
    assert_eq!(entry.category, "component");
    assert_eq!(entry.operation, "delete");
    assert_eq!(entry.entity_uuid, "p1");
    assert_eq!(entry.entity_key, "org.example:p1");
    assert_eq!(entry.entity_name, "Component p1");
    assert_eq!(entry.qualifier, "TRK");
    assert_eq!(entry.created_at, now());

    let stored = repo
        .list_by_entity("p1")
        .await
        .expect("Failed to list audit entries");
    assert_eq!(stored[0].created_at, now());
}

pub async fn test_list_by_entity(repo: &dyn AuditRepo) {
    for (uuid, qualifier, hours) in [
        ("app", Qualifier::Application, 1),
        ("pf", Qualifier::Portfolio, 2),
        ("app", Qualifier::Application, 3),
    ] {
        repo.create(deletion(uuid, qualifier, now() - Duration::hours(hours)))
            .await
            .expect("Failed to create audit entry");
    }

    let entries = repo
        .list_by_entity("app")
        .await
        .expect("Failed to list audit entries");

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.qualifier == "APP"));
    assert_eq!(entries[0].created_at, now() - Duration::hours(3));
    assert_eq!(entries[1].created_at, now() - Duration::hours(1));
}

pub async fn test_list_unknown_entity_is_empty(repo: &dyn AuditRepo) {
    let entries = repo
        .list_by_entity("missing")
        .await
        .expect("Failed to list audit entries");
    assert!(entries.is_empty());
}

pub async fn test_count(repo: &dyn AuditRepo) {
    assert_eq!(repo.count().await.expect("Failed to count"), 0);

    for uuid in ["p1", "p2"] {
        repo.create(deletion(uuid, Qualifier::Project, now()))
            .await
            .expect("Failed to create audit entry");
    }

    assert_eq!(repo.count().await.expect("Failed to count"), 2);
}

// ============================================================================
// SQLite Tests
// ============================================================================

mod sqlite_tests {
    use crate::db::{sqlite::SqliteAuditRepo, tests::harness::create_migrated_pool};

    macro_rules! sqlite_test {
        ($name:ident) => {
            #[tokio::test]
            async fn $name() {
                let pool = create_migrated_pool().await;
                let repo = SqliteAuditRepo::new(pool);
                super::$name(&repo).await;
            }
        };
    }

    sqlite_test!(test_create_records_deletion);
    sqlite_test!(test_list_by_entity);
    sqlite_test!(test_list_unknown_entity_is_empty);
    sqlite_test!(test_count);
}
