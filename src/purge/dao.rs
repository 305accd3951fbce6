//! Entry points of the engine.
//!
//! Every operation runs on a connection the caller has put inside a
//! transaction. Nothing here commits, retries or fires side effects: the
//! caller does that with the returned [`PurgeOutcome`] once the transaction
//! has committed.

use std::sync::Arc;

use sqlx::SqliteConnection;

use super::{
    background_tasks,
    clock::Clock,
    commands::PurgeCommands,
    configuration::PurgeConfiguration,
    error::{PurgeError, PurgeResult},
    evaluator::RetentionPolicyEvaluator,
    issues,
    profiler::PurgeProfiler,
    report::PurgeReport,
    scope::{self, PurgeScope},
};
use crate::{
    db::sqlite::purge_mapper::{self, AnalysisQuery},
    models::{AnalysisStatus, DeletedEntity, PurgeableAnalysis, ViewComponent},
};

/// Report and timings of one completed operation.
#[derive(Debug)]
pub struct PurgeOutcome {
    pub report: PurgeReport,
    pub profiler: PurgeProfiler,
}

impl PurgeOutcome {
    fn from_commands(commands: PurgeCommands) -> Self {
        let (report, profiler) = commands.finish();
        Self { report, profiler }
    }
}

pub struct PurgeDao {
    clock: Arc<dyn Clock>,
}

impl PurgeDao {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Apply the retention policy to one branch or portfolio.
    pub async fn purge(
        &self,
        conn: &mut SqliteConnection,
        config: &PurgeConfiguration,
    ) -> PurgeResult<PurgeOutcome> {
        config.validate()?;

        let now = self.clock.now();
        let evaluator = RetentionPolicyEvaluator::new(config, now);
        let mut commands = PurgeCommands::new();
        let root = config.root_uuid.as_str();

        self.purge_analyses(conn, &mut commands, &evaluator, root)
            .await?;

        commands
            .purge_disabled_component_data(conn, &config.disabled_component_uuids)
            .await?;

        commands.profiler_mut().start("select_issues");
        let issue_scope = [config.root_uuid.clone()];
        let plan = issues::plan(
            conn,
            &issue_scope,
            evaluator.closed_issue_cutoff(),
            &config.disabled_component_uuids,
        )
        .await?;
        commands.profiler_mut().stop();
        issues::apply(conn, &mut commands, &plan, now).await?;

        let mut task_scope = vec![config.root_uuid.clone()];
        if config.project_uuid != config.root_uuid {
            task_scope.push(config.project_uuid.clone());
        }
        background_tasks::purge_old_background_tasks(conn, &mut commands, &evaluator, &task_scope)
            .await?;

        let unused_components =
            purge_mapper::select_disabled_components_without_issues(conn, root).await?;
        commands
            .delete_disabled_components(conn, &unused_components)
            .await?;

        self.purge_inactive_branches(conn, &mut commands, &evaluator)
            .await?;

        let outcome = PurgeOutcome::from_commands(commands);
        tracing::info!(
            root = %config.root_uuid,
            project = %config.project_uuid,
            deleted_analyses = outcome.report.deleted_analyses.len(),
            closed_issues = outcome.report.closed_issues,
            removed_issues = outcome.report.removed_issue_keys.len(),
            deleted_branches = outcome.report.deleted_branches.len(),
            rows = outcome.report.total_rows(),
            "Purge complete"
        );
        Ok(outcome)
    }

    /// Aborted analyses, then thinning, then purge marking of the survivors.
    async fn purge_analyses(
        &self,
        conn: &mut SqliteConnection,
        commands: &mut PurgeCommands,
        evaluator: &RetentionPolicyEvaluator<'_>,
        root: &str,
    ) -> PurgeResult<()> {
        commands.profiler_mut().start("select_analyses");
        let aborted = purge_mapper::select_analysis_uuids(
            conn,
            &AnalysisQuery {
                root_uuid: root,
                status: Some(AnalysisStatus::Unprocessed),
                is_last: Some(false),
                not_purged: false,
            },
        )
        .await?;
        let thinned: Vec<String> = evaluator
            .select_analyses_to_delete(conn)
            .await?
            .into_iter()
            .map(|a| a.uuid)
            .collect();
        commands.profiler_mut().stop();

        if !aborted.is_empty() {
            tracing::debug!(root, count = aborted.len(), "Deleting aborted analyses");
        }
        commands.delete_analyses(conn, &aborted).await?;
        commands.delete_analyses(conn, &thinned).await?;

        let to_mark = purge_mapper::select_analysis_uuids(
            conn,
            &AnalysisQuery {
                root_uuid: root,
                status: Some(AnalysisStatus::Processed),
                is_last: Some(false),
                not_purged: true,
            },
        )
        .await?;
        commands.mark_analyses_purged(conn, &to_mark).await?;
        Ok(())
    }

    async fn purge_inactive_branches(
        &self,
        conn: &mut SqliteConnection,
        commands: &mut PurgeCommands,
        evaluator: &RetentionPolicyEvaluator<'_>,
    ) -> PurgeResult<()> {
        for branch in evaluator.select_inactive_branches(conn).await? {
            tracing::info!(branch = %branch, "Deleting inactive branch");
            let scope = PurgeScope::resolve(conn, &branch).await?;
            commands.delete_root_component(conn, &scope).await?;
            commands.report_mut().deleted_branches.push(branch);
        }
        Ok(())
    }

    /// Delete a project, application or portfolio with all its branches.
    pub async fn delete_project(
        &self,
        conn: &mut SqliteConnection,
        entity: &DeletedEntity,
    ) -> PurgeResult<PurgeOutcome> {
        require_uuid(&entity.uuid, "entity")?;
        let mut commands = PurgeCommands::new();

        for branch in scope::resolve_branch_family(conn, &entity.uuid).await? {
            if branch == entity.uuid {
                continue;
            }
            let scope = PurgeScope::resolve(conn, &branch).await?;
            commands.delete_root_component(conn, &scope).await?;
            commands.report_mut().deleted_branches.push(branch);
        }

        let scope = PurgeScope::resolve(conn, &entity.uuid).await?;
        commands.delete_root_component(conn, &scope).await?;
        commands.delete_entity(conn, &entity.uuid).await?;

        let outcome = PurgeOutcome::from_commands(commands);
        tracing::info!(
            entity = %entity.uuid,
            key = %entity.key,
            qualifier = %entity.qualifier,
            branches = outcome.report.deleted_branches.len(),
            rows = outcome.report.total_rows(),
            "Deleted project"
        );
        Ok(outcome)
    }

    /// Delete one branch or pull request. The project and its other branches stay.
    pub async fn delete_branch(
        &self,
        conn: &mut SqliteConnection,
        branch_uuid: &str,
    ) -> PurgeResult<PurgeOutcome> {
        require_uuid(branch_uuid, "branch")?;
        if purge_mapper::project_exists(conn, branch_uuid).await? {
            return Err(PurgeError::InvalidConfiguration(format!(
                "{branch_uuid} is a project, not a branch"
            )));
        }

        let mut commands = PurgeCommands::new();
        let scope = PurgeScope::resolve(conn, branch_uuid).await?;
        commands.delete_root_component(conn, &scope).await?;
        commands
            .report_mut()
            .deleted_branches
            .push(branch_uuid.to_string());

        let outcome = PurgeOutcome::from_commands(commands);
        tracing::info!(
            branch = %branch_uuid,
            rows = outcome.report.total_rows(),
            "Deleted branch"
        );
        Ok(outcome)
    }

    /// Delete analyses and what hangs off them. Unknown uuids are ignored.
    pub async fn delete_analyses(
        &self,
        conn: &mut SqliteConnection,
        analysis_uuids: &[String],
    ) -> PurgeResult<PurgeOutcome> {
        let mut requested = analysis_uuids.to_vec();
        requested.sort();
        requested.dedup();

        let existing = purge_mapper::select_existing_analysis_uuids(conn, &requested).await?;
        let mut commands = PurgeCommands::new();
        commands.delete_analyses(conn, &existing).await?;

        let outcome = PurgeOutcome::from_commands(commands);
        tracing::debug!(
            requested = requested.len(),
            deleted = outcome.report.deleted_analyses.len(),
            "Deleted analyses"
        );
        Ok(outcome)
    }

    /// Remove sub-portfolios and project copies from a portfolio tree.
    ///
    /// Roots are never removed here; when only roots are given, storage is
    /// not touched at all.
    pub async fn delete_non_root_components_in_view(
        &self,
        conn: &mut SqliteConnection,
        components: &[ViewComponent],
    ) -> PurgeResult<PurgeOutcome> {
        let mut commands = PurgeCommands::new();
        let non_roots: Vec<String> = components
            .iter()
            .filter(|c| !c.is_root())
            .map(|c| c.uuid.clone())
            .collect();

        if non_roots.is_empty() {
            return Ok(PurgeOutcome::from_commands(commands));
        }

        commands.delete_view_components(conn, &non_roots).await?;
        Ok(PurgeOutcome::from_commands(commands))
    }

    /// Processed analyses of a branch retention may consider, baselines excluded.
    pub async fn select_purgeable_analyses(
        &self,
        conn: &mut SqliteConnection,
        branch_uuid: &str,
    ) -> PurgeResult<Vec<PurgeableAnalysis>> {
        Ok(purge_mapper::select_purgeable_analyses(conn, branch_uuid).await?)
    }
}

fn require_uuid(uuid: &str, what: &str) -> PurgeResult<()> {
    if uuid.trim().is_empty() {
        return Err(PurgeError::InvalidConfiguration(format!(
            "{what} uuid is empty"
        )));
    }
    Ok(())
}
