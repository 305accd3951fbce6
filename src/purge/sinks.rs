//! Side-effect emitters fired after a successful commit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::{AuditRepo, DbResult},
    models::{CreateAuditEntry, DeletedEntity},
};

/// Receives what a purge removed, for downstream index cleanup.
#[async_trait]
pub trait PurgeListener: Send + Sync {
    /// Called at most once per purge, only when issues were hard-deleted.
    async fn on_issues_removed(&self, project_uuid: &str, issue_keys: &[String]);

    /// Called once per purge with the disabled components that were processed.
    async fn on_components_disabling(&self, _root_uuid: &str, _component_uuids: &[String]) {}
}

/// Records top-level deletions in the audit trail.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Not called for branch-only deletions, nor when the entity was already gone.
    async fn on_entity_deleted(
        &self,
        entity: &DeletedEntity,
        deleted_at: DateTime<Utc>,
    ) -> DbResult<()>;
}

#[derive(Debug, Default)]
pub struct NoopPurgeListener;

#[async_trait]
impl PurgeListener for NoopPurgeListener {
    async fn on_issues_removed(&self, _project_uuid: &str, _issue_keys: &[String]) {}
}

/// Logs removals instead of forwarding them.
#[derive(Debug, Default)]
pub struct LoggingPurgeListener;

#[async_trait]
impl PurgeListener for LoggingPurgeListener {
    async fn on_issues_removed(&self, project_uuid: &str, issue_keys: &[String]) {
        tracing::info!(
            project = %project_uuid,
            count = issue_keys.len(),
            "Issues removed from analysis history"
        );
    }

    async fn on_components_disabling(&self, root_uuid: &str, component_uuids: &[String]) {
        tracing::info!(
            root = %root_uuid,
            count = component_uuids.len(),
            "Disabled components purged"
        );
    }
}

#[derive(Debug, Default)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn on_entity_deleted(
        &self,
        _entity: &DeletedEntity,
        _deleted_at: DateTime<Utc>,
    ) -> DbResult<()> {
        Ok(())
    }
}

/// Persists deletions through the audit repository.
pub struct DbAuditSink {
    repo: Arc<dyn AuditRepo>,
}

impl DbAuditSink {
    pub fn new(repo: Arc<dyn AuditRepo>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AuditSink for DbAuditSink {
    async fn on_entity_deleted(
        &self,
        entity: &DeletedEntity,
        deleted_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let entry = self
            .repo
            .create(CreateAuditEntry::component_deleted(entity, deleted_at))
            .await?;
        tracing::debug!(
            audit = %entry.uuid,
            entity = %entry.entity_uuid,
            qualifier = %entry.qualifier,
            "Recorded component deletion"
        );
        Ok(())
    }
}
