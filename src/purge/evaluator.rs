//! Decides which analyses, branches and background tasks are past retention.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqliteConnection;

use super::{
    configuration::PurgeConfiguration,
    filters::{AnalysisFilter, before, select_analyses_to_delete},
};
use crate::{
    db::{DbResult, sqlite::purge_mapper},
    models::PurgeableAnalysis,
};

/// Background tasks past their retention periods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OldBackgroundTasks {
    /// Finished tasks whose whole record goes
    pub activities: Vec<String>,
    /// Tasks whose scanner context alone goes
    pub scanner_contexts: Vec<String>,
}

/// Retention rules of one purge, evaluated against a fixed "now".
pub struct RetentionPolicyEvaluator<'a> {
    config: &'a PurgeConfiguration,
    now: DateTime<Utc>,
}

impl<'a> RetentionPolicyEvaluator<'a> {
    pub fn new(config: &'a PurgeConfiguration, now: DateTime<Utc>) -> Self {
        Self { config, now }
    }

    fn days_ago(&self, days: u32) -> DateTime<Utc> {
        before(self.now, Duration::try_days(i64::from(days)))
    }

    pub fn analysis_cutoff(&self) -> DateTime<Utc> {
        self.days_ago(self.config.max_analysis_age_days)
    }

    pub fn closed_issue_cutoff(&self) -> Option<DateTime<Utc>> {
        self.config
            .closed_issue_max_age_days
            .map(|days| self.days_ago(days))
    }

    pub fn inactive_branch_cutoff(&self) -> Option<DateTime<Utc>> {
        self.config
            .inactive_branch_max_age_days
            .map(|days| self.days_ago(days))
    }

    pub fn ce_activity_cutoff(&self) -> DateTime<Utc> {
        self.days_ago(self.config.ce_activity_max_age_days)
    }

    pub fn scanner_context_cutoff(&self) -> DateTime<Utc> {
        self.days_ago(self.config.scanner_context_max_age_days)
    }

    pub fn filters(&self) -> Vec<AnalysisFilter> {
        AnalysisFilter::chain(
            self.now,
            self.config.max_analysis_age_days,
            &self.config.thinning,
        )
    }

    /// Processed analyses of a branch that are not pinned as a baseline.
    ///
    /// The last analysis is reported with `last = true`; callers never delete it.
    pub async fn select_purgeable_analyses(
        &self,
        conn: &mut SqliteConnection,
        branch_uuid: &str,
    ) -> DbResult<Vec<PurgeableAnalysis>> {
        purge_mapper::select_purgeable_analyses(conn, branch_uuid).await
    }

    /// Analyses of the root the thinning chain deletes.
    pub async fn select_analyses_to_delete(
        &self,
        conn: &mut SqliteConnection,
    ) -> DbResult<Vec<PurgeableAnalysis>> {
        let history = self
            .select_purgeable_analyses(conn, &self.config.root_uuid)
            .await?;
        Ok(select_analyses_to_delete(history, &self.filters()))
    }

    /// Stale branches and pull requests of the project.
    ///
    /// The root of this purge is never returned, so an analysis in flight on
    /// it cannot lose its branch.
    pub async fn select_inactive_branches(
        &self,
        conn: &mut SqliteConnection,
    ) -> DbResult<Vec<String>> {
        let Some(cutoff) = self.inactive_branch_cutoff() else {
            return Ok(Vec::new());
        };
        let mut branches =
            purge_mapper::select_inactive_branches(conn, &self.config.project_uuid, cutoff).await?;
        branches.retain(|uuid| uuid != &self.config.root_uuid);
        Ok(branches)
    }

    /// Finished tasks of `scope` older than the activity cutoff, and scanner
    /// contexts older than their own, independent cutoff.
    pub async fn select_old_background_tasks(
        &self,
        conn: &mut SqliteConnection,
        scope: &[String],
    ) -> DbResult<OldBackgroundTasks> {
        let activities =
            purge_mapper::select_old_activity_uuids(conn, scope, self.ce_activity_cutoff()).await?;
        let scanner_contexts = purge_mapper::select_old_scanner_context_uuids(
            conn,
            scope,
            self.scanner_context_cutoff(),
        )
        .await?;
        Ok(OldBackgroundTasks {
            activities,
            scanner_contexts,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::config::RetentionConfig;

    #[test]
    fn test_cutoffs() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let config = PurgeConfiguration {
            max_analysis_age_days: 30,
            closed_issue_max_age_days: Some(10),
            inactive_branch_max_age_days: None,
            ce_activity_max_age_days: 180,
            scanner_context_max_age_days: 28,
            ..PurgeConfiguration::from_settings("b", "p", vec![], &RetentionConfig::default())
        };
        let evaluator = RetentionPolicyEvaluator::new(&config, now);

        assert_eq!(evaluator.analysis_cutoff(), now - Duration::days(30));
        assert_eq!(evaluator.closed_issue_cutoff(), Some(now - Duration::days(10)));
        assert_eq!(evaluator.inactive_branch_cutoff(), None);
        assert_eq!(evaluator.ce_activity_cutoff(), now - Duration::days(180));
        assert_eq!(evaluator.scanner_context_cutoff(), now - Duration::days(28));
    }

    #[test]
    fn test_cutoff_past_start_of_time_is_clamped() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let config = PurgeConfiguration {
            max_analysis_age_days: u32::MAX,
            ..PurgeConfiguration::from_settings("b", "p", vec![], &RetentionConfig::default())
        };
        let evaluator = RetentionPolicyEvaluator::new(&config, now);

        assert_eq!(evaluator.analysis_cutoff(), DateTime::<Utc>::MIN_UTC);
        assert_eq!(evaluator.ce_activity_cutoff(), now - Duration::days(180));
    }
}
