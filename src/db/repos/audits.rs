use async_trait::async_trait;

use crate::{
    db::error::DbResult,
    models::{AuditEntry, CreateAuditEntry},
};

#[async_trait]
pub trait AuditRepo: Send + Sync {
    /// Record a new audit entry
    async fn create(&self, input: CreateAuditEntry) -> DbResult<AuditEntry>;

    /// List the audit entries recorded for an entity, oldest first
    async fn list_by_entity(&self, entity_uuid: &str) -> DbResult<Vec<AuditEntry>>;

    /// Count all audit entries
    async fn count(&self) -> DbResult<i64>;
}
