//! Closing and removal of issues.
//!
//! Each issue of the scope gets exactly one decision per purge, computed
//! before anything is written:
//!
//! 1. its component no longer exists: hard delete
//! 2. it was closed before the retention cutoff: hard delete
//! 3. it is open on a component flagged for closure: close as removed
//! 4. otherwise: keep

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::commands::PurgeCommands;
use crate::{
    db::{DbResult, sqlite::purge_mapper},
    models::IssueRetentionRow,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Orphan,
    ExpiredClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueDecision {
    Close,
    HardDelete(RemovalReason),
    Keep,
}

/// Decide the fate of one issue.
pub fn decide(
    issue: &IssueRetentionRow,
    closed_before: Option<DateTime<Utc>>,
    closable_components: &HashSet<&str>,
) -> IssueDecision {
    if !issue.component_exists {
        return IssueDecision::HardDelete(RemovalReason::Orphan);
    }
    if let (Some(cutoff), Some(closed_at)) = (closed_before, issue.close_date)
        && issue.is_closed()
        && closed_at < cutoff
    {
        return IssueDecision::HardDelete(RemovalReason::ExpiredClosed);
    }
    if issue.is_open() && closable_components.contains(issue.component_uuid.as_str()) {
        return IssueDecision::Close;
    }
    IssueDecision::Keep
}

/// Decisions of one purge pass, grouped by what will be done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePlan {
    pub to_close: Vec<String>,
    pub orphans: Vec<String>,
    pub expired: Vec<String>,
}

impl IssuePlan {
    /// Build a plan from candidate rows. Duplicate rows are decided once.
    pub fn from_rows(
        rows: impl IntoIterator<Item = IssueRetentionRow>,
        closed_before: Option<DateTime<Utc>>,
        closable_components: &[String],
    ) -> Self {
        let closable: HashSet<&str> = closable_components.iter().map(String::as_str).collect();
        let unique: BTreeMap<String, IssueRetentionRow> =
            rows.into_iter().map(|row| (row.key.clone(), row)).collect();

        let mut plan = IssuePlan::default();
        for (key, issue) in unique {
            match decide(&issue, closed_before, &closable) {
                IssueDecision::Close => plan.to_close.push(key),
                IssueDecision::HardDelete(RemovalReason::Orphan) => plan.orphans.push(key),
                IssueDecision::HardDelete(RemovalReason::ExpiredClosed) => plan.expired.push(key),
                IssueDecision::Keep => {}
            }
        }
        plan
    }

    /// Every issue to hard delete.
    pub fn to_delete(&self) -> Vec<String> {
        let mut keys = self.orphans.clone();
        keys.extend(self.expired.iter().cloned());
        keys.sort();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.to_close.is_empty() && self.orphans.is_empty() && self.expired.is_empty()
    }
}

/// Load candidates of the scope and decide each of them.
pub async fn plan(
    conn: &mut SqliteConnection,
    scope: &[String],
    closed_before: Option<DateTime<Utc>>,
    closable_components: &[String],
) -> DbResult<IssuePlan> {
    let mut rows =
        purge_mapper::select_orphan_and_old_closed_issues(conn, scope, closed_before).await?;
    rows.extend(
        purge_mapper::select_issues_of_components(conn, scope, closable_components).await?,
    );
    Ok(IssuePlan::from_rows(rows, closed_before, closable_components))
}

/// Apply a plan: close first, then hard delete.
pub async fn apply(
    conn: &mut SqliteConnection,
    commands: &mut PurgeCommands,
    plan: &IssuePlan,
    now: DateTime<Utc>,
) -> DbResult<()> {
    if plan.is_empty() {
        return Ok(());
    }
    let closed = commands.close_issues(conn, &plan.to_close, now).await?;
    commands.delete_issues(conn, &plan.to_delete()).await?;
    tracing::debug!(
        closed,
        orphans = plan.orphans.len(),
        expired = plan.expired.len(),
        "Issue lifecycle applied"
    );
    Ok(())
}

/// Close open issues of the listed components. Issues on components not
/// listed stay untouched, disabled or not.
pub async fn close_issues_of_disabled_components(
    conn: &mut SqliteConnection,
    commands: &mut PurgeCommands,
    scope: &[String],
    disabled_component_uuids: &[String],
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let rows =
        purge_mapper::select_issues_of_components(conn, scope, disabled_component_uuids).await?;
    let plan = IssuePlan::from_rows(rows, None, disabled_component_uuids);
    commands.close_issues(conn, &plan.to_close, now).await
}

/// Hard-delete issues whose component is gone. Returns their keys.
pub async fn delete_orphan_issues(
    conn: &mut SqliteConnection,
    commands: &mut PurgeCommands,
    scope: &[String],
) -> DbResult<Vec<String>> {
    let rows = purge_mapper::select_orphan_and_old_closed_issues(conn, scope, None).await?;
    let plan = IssuePlan::from_rows(rows, None, &[]);
    commands.delete_issues(conn, &plan.orphans).await?;
    Ok(plan.orphans)
}

/// Hard-delete issues closed before `closed_before`. Returns their keys.
pub async fn delete_old_closed_issues(
    conn: &mut SqliteConnection,
    commands: &mut PurgeCommands,
    scope: &[String],
    closed_before: DateTime<Utc>,
) -> DbResult<Vec<String>> {
    let rows =
        purge_mapper::select_orphan_and_old_closed_issues(conn, scope, Some(closed_before)).await?;
    let plan = IssuePlan::from_rows(rows, Some(closed_before), &[]);
    commands.delete_issues(conn, &plan.expired).await?;
    Ok(plan.expired)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::{RESOLUTION_REMOVED, STATUS_CLOSED, STATUS_OPEN, STATUS_RESOLVED};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
    }

    fn issue(key: &str, component: &str, status: &str) -> IssueRetentionRow {
        IssueRetentionRow {
            key: key.to_string(),
            component_uuid: component.to_string(),
            status: status.to_string(),
            resolution: None,
            close_date: None,
            component_exists: true,
        }
    }

    fn closed(key: &str, days_ago: i64) -> IssueRetentionRow {
        IssueRetentionRow {
            resolution: Some("FIXED".into()),
            close_date: Some(now() - Duration::days(days_ago)),
            ..issue(key, "c", STATUS_CLOSED)
        }
    }

    #[test]
    fn test_orphan_wins_over_everything() {
        let row = IssueRetentionRow {
            component_exists: false,
            ..issue("i1", "c", STATUS_OPEN)
        };
        let closable = HashSet::from(["c"]);
        assert_eq!(
            decide(&row, None, &closable),
            IssueDecision::HardDelete(RemovalReason::Orphan)
        );
    }

    #[test]
    fn test_expired_closed_issue() {
        let cutoff = Some(now() - Duration::days(30));
        let none = HashSet::new();
        assert_eq!(
            decide(&closed("old", 31), cutoff, &none),
            IssueDecision::HardDelete(RemovalReason::ExpiredClosed)
        );
        assert_eq!(decide(&closed("young", 29), cutoff, &none), IssueDecision::Keep);
        assert_eq!(decide(&closed("old", 31), None, &none), IssueDecision::Keep);
    }

    #[test]
    fn test_only_listed_components_get_closed() {
        let closable = HashSet::from(["c"]);
        assert_eq!(
            decide(&issue("i1", "c", STATUS_OPEN), None, &closable),
            IssueDecision::Close
        );
        assert_eq!(
            decide(&issue("i2", "d", STATUS_OPEN), None, &closable),
            IssueDecision::Keep
        );
    }

    #[test]
    fn test_resolved_issues_are_not_reclosed() {
        let closable = HashSet::from(["c"]);
        let resolved = IssueRetentionRow {
            resolution: Some("FIXED".into()),
            ..issue("i1", "c", STATUS_RESOLVED)
        };
        let removed = IssueRetentionRow {
            resolution: Some(RESOLUTION_REMOVED.into()),
            close_date: Some(now()),
            ..issue("i2", "c", STATUS_CLOSED)
        };
        assert_eq!(decide(&resolved, None, &closable), IssueDecision::Keep);
        assert_eq!(decide(&removed, None, &closable), IssueDecision::Keep);
    }

    #[test]
    fn test_plan_deduplicates_rows() {
        let orphan = IssueRetentionRow {
            component_exists: false,
            ..issue("orphan", "gone", STATUS_OPEN)
        };
        let rows = vec![
            orphan.clone(),
            orphan,
            issue("open", "c", STATUS_OPEN),
            closed("expired", 40),
        ];
        let plan = IssuePlan::from_rows(rows, Some(now() - Duration::days(30)), &["c".to_string()]);

        assert_eq!(plan.to_close, ["open"]);
        assert_eq!(plan.orphans, ["orphan"]);
        assert_eq!(plan.expired, ["expired"]);
        assert_eq!(plan.to_delete(), ["expired", "orphan"]);
        assert!(!plan.is_empty());
    }
}
