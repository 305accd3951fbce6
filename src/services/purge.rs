use std::sync::Arc;

use crate::{
    db::DbPool,
    models::{DeletedEntity, PurgeableAnalysis, ViewComponent},
    observability::metrics,
    purge::{
        AuditSink, Clock, DbAuditSink, NoopPurgeListener, PurgeConfiguration, PurgeDao,
        PurgeError, PurgeListener, PurgeOutcome, PurgeResult, PurgeScope, SystemClock,
    },
};

/// Service layer for retention and cascading deletion.
///
/// Each call runs in its own transaction. Listener and audit notifications
/// are sent only after that transaction commits; a failed call rolls back
/// and notifies nobody.
#[derive(Clone)]
pub struct PurgeService {
    db: Arc<DbPool>,
    dao: Arc<PurgeDao>,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn PurgeListener>,
    audit: Arc<dyn AuditSink>,
}

impl PurgeService {
    /// Wall clock, no listener, audit entries written to the same database.
    pub fn new(db: Arc<DbPool>) -> Self {
        let audit = Arc::new(DbAuditSink::new(db.audits()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            db,
            dao: Arc::new(PurgeDao::new(clock.clone())),
            clock,
            listener: Arc::new(NoopPurgeListener),
            audit,
        }
    }

    /// Clock used for retention cutoffs and audit timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.dao = Arc::new(PurgeDao::new(clock.clone()));
        self.clock = clock;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn PurgeListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Run retention on one branch or portfolio.
    pub async fn purge(&self, config: &PurgeConfiguration) -> PurgeResult<PurgeOutcome> {
        let result = async {
            let mut tx = self.db.begin().await?;
            let outcome = self.dao.purge(&mut *tx, config).await?;
            tx.commit().await?;
            Ok::<_, PurgeError>(outcome)
        }
        .await;
        let outcome = observe("purge", result)?;

        if !outcome.report.removed_issue_keys.is_empty() {
            self.listener
                .on_issues_removed(&config.project_uuid, &outcome.report.removed_issue_keys)
                .await;
        }
        if !config.disabled_component_uuids.is_empty() {
            self.listener
                .on_components_disabling(&config.root_uuid, &config.disabled_component_uuids)
                .await;
        }
        Ok(outcome)
    }

    /// Delete a project, application or portfolio, then audit the deletion.
    ///
    /// Nothing is audited when the entity was already gone. An audit failure
    /// is logged; the deletion itself stays committed.
    pub async fn delete_project(&self, entity: &DeletedEntity) -> PurgeResult<PurgeOutcome> {
        let result = async {
            let mut tx = self.db.begin().await?;
            let outcome = self.dao.delete_project(&mut *tx, entity).await?;
            tx.commit().await?;
            Ok::<_, PurgeError>(outcome)
        }
        .await;
        let outcome = observe("delete_project", result)?;
        if !outcome.report.removed_entity() {
            tracing::debug!(entity = %entity.uuid, "Entity already deleted, not audited");
            return Ok(outcome);
        }

        if let Err(e) = self.audit.on_entity_deleted(entity, self.clock.now()).await {
            tracing::warn!(
                entity = %entity.uuid,
                error = %e,
                "Failed to record deletion in the audit trail"
            );
        }
        Ok(outcome)
    }

    /// Delete one branch or pull request. Nothing is audited.
    pub async fn delete_branch(&self, branch_uuid: &str) -> PurgeResult<PurgeOutcome> {
        let result = async {
            let mut tx = self.db.begin().await?;
            let outcome = self.dao.delete_branch(&mut *tx, branch_uuid).await?;
            tx.commit().await?;
            Ok::<_, PurgeError>(outcome)
        }
        .await;
        observe("delete_branch", result)
    }

    pub async fn delete_analyses(&self, analysis_uuids: &[String]) -> PurgeResult<PurgeOutcome> {
        let result = async {
            let mut tx = self.db.begin().await?;
            let outcome = self.dao.delete_analyses(&mut *tx, analysis_uuids).await?;
            tx.commit().await?;
            Ok::<_, PurgeError>(outcome)
        }
        .await;
        observe("delete_analyses", result)
    }

    pub async fn delete_non_root_components_in_view(
        &self,
        components: &[ViewComponent],
    ) -> PurgeResult<PurgeOutcome> {
        let result = async {
            let mut tx = self.db.begin().await?;
            let outcome = self
                .dao
                .delete_non_root_components_in_view(&mut *tx, components)
                .await?;
            tx.commit().await?;
            Ok::<_, PurgeError>(outcome)
        }
        .await;
        observe("delete_view_components", result)
    }

    pub async fn select_purgeable_analyses(
        &self,
        branch_uuid: &str,
    ) -> PurgeResult<Vec<PurgeableAnalysis>> {
        let mut conn = self.db.pool().acquire().await?;
        self.dao.select_purgeable_analyses(&mut *conn, branch_uuid).await
    }

    /// Root plus sub-portfolios a purge of `root_uuid` would cover.
    pub async fn resolve_scope(&self, root_uuid: &str) -> PurgeResult<PurgeScope> {
        let mut conn = self.db.pool().acquire().await?;
        Ok(PurgeScope::resolve(&mut *conn, root_uuid).await?)
    }
}

/// Log and count the result of a finished operation.
fn observe(
    operation: &'static str,
    result: PurgeResult<PurgeOutcome>,
) -> PurgeResult<PurgeOutcome> {
    match &result {
        Ok(outcome) => {
            outcome.profiler.log_summary(operation);
            for (step, rows) in &outcome.report.rows_by_step {
                metrics::record_rows_deleted(step, *rows);
            }
            metrics::record_purge_run(operation, "success");
        }
        Err(e) => {
            tracing::error!(operation, error = %e, "Purge operation rolled back");
            metrics::record_purge_run(operation, "error");
        }
    }
    result
}
