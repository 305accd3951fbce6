//! Executes deletion steps and keeps track of what they did.

use std::time::Instant;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::{
    profiler::PurgeProfiler,
    report::PurgeReport,
    scope::PurgeScope,
    steps::{
        ACTIVITY_CASCADE, ANALYSIS_CASCADE, ANALYSIS_PURGE_MARKING, DISABLED_COMPONENT_CASCADE,
        DISABLED_COMPONENT_DATA, DeletionStep, ENTITY_CASCADE, ISSUE_CASCADE, ROOT_CASCADE,
        SCANNER_CONTEXT_CASCADE, TargetIds, VIEW_COMPONENT_CASCADE,
    },
};
use crate::db::{DbResult, sqlite::purge_mapper};

/// Runs cascades on the caller's transaction.
///
/// Every method is a no-op for empty id lists.
#[derive(Debug, Default)]
pub struct PurgeCommands {
    profiler: PurgeProfiler,
    report: PurgeReport,
}

impl PurgeCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `steps` in order. Returns the rows affected across all of them.
    pub async fn run_steps(
        &mut self,
        conn: &mut SqliteConnection,
        steps: &[DeletionStep],
        targets: &TargetIds,
    ) -> DbResult<u64> {
        let mut total = 0;
        for step in steps {
            let started = Instant::now();
            let rows =
                purge_mapper::execute_step(conn, step.sql, targets.for_target(step.target)).await?;
            self.profiler.record(step.name, started.elapsed());
            self.report.record_step(step.name, rows);
            if rows > 0 {
                tracing::trace!(step = step.name, rows, "Purge step applied");
            }
            total += rows;
        }
        Ok(total)
    }

    async fn run_listed(
        &mut self,
        conn: &mut SqliteConnection,
        steps: &[DeletionStep],
        ids: &[String],
    ) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.run_steps(conn, steps, &TargetIds::listed(ids)).await
    }

    /// Delete analyses with their events, measures and properties.
    pub async fn delete_analyses(
        &mut self,
        conn: &mut SqliteConnection,
        analysis_uuids: &[String],
    ) -> DbResult<()> {
        self.run_listed(conn, ANALYSIS_CASCADE, analysis_uuids)
            .await?;
        self.report
            .deleted_analyses
            .extend(analysis_uuids.iter().cloned());
        Ok(())
    }

    pub async fn mark_analyses_purged(
        &mut self,
        conn: &mut SqliteConnection,
        analysis_uuids: &[String],
    ) -> DbResult<()> {
        self.run_listed(conn, ANALYSIS_PURGE_MARKING, analysis_uuids)
            .await?;
        Ok(())
    }

    /// Delete everything under a root, then the root's component and branch rows.
    pub async fn delete_root_component(
        &mut self,
        conn: &mut SqliteConnection,
        scope: &PurgeScope,
    ) -> DbResult<()> {
        self.run_steps(conn, ROOT_CASCADE, &scope.targets()).await?;
        Ok(())
    }

    /// Delete the membership rows and the project, application or portfolio row itself.
    pub async fn delete_entity(
        &mut self,
        conn: &mut SqliteConnection,
        entity_uuid: &str,
    ) -> DbResult<()> {
        self.run_listed(conn, ENTITY_CASCADE, &[entity_uuid.to_string()])
            .await?;
        Ok(())
    }

    pub async fn delete_view_components(
        &mut self,
        conn: &mut SqliteConnection,
        component_uuids: &[String],
    ) -> DbResult<()> {
        self.run_listed(conn, VIEW_COMPONENT_CASCADE, component_uuids)
            .await?;
        self.report
            .deleted_components
            .extend(component_uuids.iter().cloned());
        Ok(())
    }

    /// Drop file sources and live measures of components the last analysis disabled.
    pub async fn purge_disabled_component_data(
        &mut self,
        conn: &mut SqliteConnection,
        component_uuids: &[String],
    ) -> DbResult<()> {
        self.run_listed(conn, DISABLED_COMPONENT_DATA, component_uuids)
            .await?;
        self.report
            .disabled_components
            .extend(component_uuids.iter().cloned());
        Ok(())
    }

    pub async fn delete_disabled_components(
        &mut self,
        conn: &mut SqliteConnection,
        component_uuids: &[String],
    ) -> DbResult<()> {
        self.run_listed(conn, DISABLED_COMPONENT_CASCADE, component_uuids)
            .await?;
        self.report
            .deleted_components
            .extend(component_uuids.iter().cloned());
        Ok(())
    }

    /// Hard-delete issues with their changes, markers and impacts.
    pub async fn delete_issues(
        &mut self,
        conn: &mut SqliteConnection,
        issue_keys: &[String],
    ) -> DbResult<()> {
        self.run_listed(conn, ISSUE_CASCADE, issue_keys).await?;
        self.report
            .removed_issue_keys
            .extend(issue_keys.iter().cloned());
        Ok(())
    }

    /// Close issues as removed. Returns how many were actually open.
    pub async fn close_issues(
        &mut self,
        conn: &mut SqliteConnection,
        issue_keys: &[String],
        now: DateTime<Utc>,
    ) -> DbResult<u64> {
        if issue_keys.is_empty() {
            return Ok(0);
        }
        let started = Instant::now();
        let closed = purge_mapper::close_issues(conn, issue_keys, now).await?;
        self.profiler.record("close_issues", started.elapsed());
        self.report.record_step("close_issues", closed);
        self.report.closed_issues += closed;
        Ok(closed)
    }

    pub async fn delete_activities(
        &mut self,
        conn: &mut SqliteConnection,
        task_uuids: &[String],
    ) -> DbResult<()> {
        self.run_listed(conn, ACTIVITY_CASCADE, task_uuids).await?;
        Ok(())
    }

    pub async fn delete_scanner_contexts(
        &mut self,
        conn: &mut SqliteConnection,
        task_uuids: &[String],
    ) -> DbResult<()> {
        self.run_listed(conn, SCANNER_CONTEXT_CASCADE, task_uuids)
            .await?;
        Ok(())
    }

    pub fn report(&self) -> &PurgeReport {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut PurgeReport {
        &mut self.report
    }

    pub fn profiler_mut(&mut self) -> &mut PurgeProfiler {
        &mut self.profiler
    }

    /// Hand back the report, with its duration set from the profiler.
    pub fn finish(self) -> (PurgeReport, PurgeProfiler) {
        let mut report = self.report;
        report.duration = self.profiler.total();
        (report, self.profiler)
    }
}
