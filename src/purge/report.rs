use std::time::Duration;

use serde::Serialize;

/// What an engine call removed or closed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurgeReport {
    /// Rows affected per cascade step, in execution order
    pub rows_by_step: Vec<(String, u64)>,
    pub deleted_analyses: Vec<String>,
    pub deleted_branches: Vec<String>,
    pub deleted_components: Vec<String>,
    /// Disabled components whose data was cleaned up
    pub disabled_components: Vec<String>,
    pub closed_issues: u64,
    /// Orphaned and expired issues that were hard-deleted
    pub removed_issue_keys: Vec<String>,
    pub duration: Duration,
}

impl PurgeReport {
    /// Add rows to a step, summing repeated steps.
    pub fn record_step(&mut self, step: &str, rows: u64) {
        match self.rows_by_step.iter_mut().find(|(name, _)| name == step) {
            Some((_, total)) => *total += rows,
            None => self.rows_by_step.push((step.to_string(), rows)),
        }
    }

    pub fn rows(&self, step: &str) -> u64 {
        self.rows_by_step
            .iter()
            .find(|(name, _)| name == step)
            .map(|(_, rows)| *rows)
            .unwrap_or(0)
    }

    /// Total rows affected across all steps.
    pub fn total_rows(&self) -> u64 {
        self.rows_by_step.iter().map(|(_, rows)| rows).sum()
    }

    pub fn has_deletions(&self) -> bool {
        self.total_rows() > 0
    }

    /// Whether the top-level `projects` row was removed.
    pub fn removed_entity(&self) -> bool {
        self.rows("projects") > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = PurgeReport::default();
        assert_eq!(report.total_rows(), 0);
        assert!(!report.has_deletions());
        assert_eq!(report.rows("snapshots"), 0);
        assert!(!report.removed_entity());
    }

    #[test]
    fn test_removed_entity_follows_projects_step() {
        let mut report = PurgeReport::default();
        report.record_step("components", 4);
        report.record_step("projects", 0);
        assert!(!report.removed_entity());

        report.record_step("projects", 1);
        assert!(report.removed_entity());
    }

    #[test]
    fn test_steps_accumulate() {
        let mut report = PurgeReport::default();
        report.record_step("events", 2);
        report.record_step("snapshots", 3);
        report.record_step("events", 1);

        assert_eq!(report.rows("events"), 3);
        assert_eq!(report.total_rows(), 6);
        assert!(report.has_deletions());
        assert_eq!(report.rows_by_step[0].0, "events");
    }
}
