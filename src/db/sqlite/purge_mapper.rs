//! Set-based queries the purge engine runs inside the caller's transaction.
//!
//! Every function takes the open connection of that transaction. Unknown
//! identifiers simply match nothing.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, sqlite::SqliteRow};

use super::common::{
    execute_chunked, fetch_rows_chunked, fetch_strings_chunked, from_millis, to_millis,
};
use crate::{
    db::error::DbResult,
    models::{
        AnalysisStatus, IssueRetentionRow, OPEN_STATUSES, PurgeableAnalysis, RESOLUTION_REMOVED,
        STATUS_CLOSED, VERSION_EVENT_CATEGORY,
    },
};

/// New-code-period type that pins a single analysis as the baseline.
const SPECIFIC_ANALYSIS: &str = "SPECIFIC_ANALYSIS";

/// Filter for [`select_analysis_uuids`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisQuery<'a> {
    pub root_uuid: &'a str,
    pub status: Option<AnalysisStatus>,
    pub is_last: Option<bool>,
    /// Only analyses whose purge status is not yet set
    pub not_purged: bool,
}

/// Run one parameterized statement whose `{ids}` placeholders take `ids`.
pub async fn execute_step(conn: &mut SqliteConnection, sql: &str, ids: &[String]) -> DbResult<u64> {
    execute_chunked(conn, sql, &[], ids).await
}

// ==================== Scope ====================

/// The root itself plus the sub-portfolios of its tree.
pub async fn select_root_and_subviews(
    conn: &mut SqliteConnection,
    root_uuid: &str,
) -> DbResult<Vec<String>> {
    let uuids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT uuid FROM components
        WHERE uuid = ?
           OR (branch_uuid = ? AND scope = 'PRJ' AND qualifier = 'SVW')
        ORDER BY uuid
        "#,
    )
    .bind(root_uuid)
    .bind(root_uuid)
    .fetch_all(&mut *conn)
    .await?;

    Ok(uuids)
}

pub async fn select_branch_uuids_by_project(
    conn: &mut SqliteConnection,
    project_uuid: &str,
) -> DbResult<Vec<String>> {
    let uuids = sqlx::query_scalar::<_, String>(
        "SELECT uuid FROM project_branches WHERE project_uuid = ? ORDER BY uuid",
    )
    .bind(project_uuid)
    .fetch_all(&mut *conn)
    .await?;

    Ok(uuids)
}

pub async fn project_exists(conn: &mut SqliteConnection, uuid: &str) -> DbResult<bool> {
    let exists =
        sqlx::query_scalar::<_, i64>("SELECT EXISTS (SELECT 1 FROM projects WHERE uuid = ?)")
            .bind(uuid)
            .fetch_one(&mut *conn)
            .await?;

    Ok(exists != 0)
}

// ==================== Analyses ====================

/// The subset of `uuids` that names a stored analysis.
pub async fn select_existing_analysis_uuids(
    conn: &mut SqliteConnection,
    uuids: &[String],
) -> DbResult<Vec<String>> {
    let mut existing = fetch_strings_chunked(
        conn,
        "SELECT uuid FROM snapshots WHERE uuid IN ({ids})",
        &[],
        uuids,
    )
    .await?;
    existing.sort();
    Ok(existing)
}

pub async fn select_analysis_uuids(
    conn: &mut SqliteConnection,
    query: &AnalysisQuery<'_>,
) -> DbResult<Vec<String>> {
    let mut sql = String::from("SELECT uuid FROM snapshots WHERE root_component_uuid = ?");
    if query.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if query.is_last.is_some() {
        sql.push_str(" AND islast = ?");
    }
    if query.not_purged {
        sql.push_str(" AND (purge_status IS NULL OR purge_status = 0)");
    }
    sql.push_str(" ORDER BY created_at, uuid");

    let mut q = sqlx::query_scalar::<_, String>(&sql).bind(query.root_uuid);
    if let Some(status) = query.status {
        q = q.bind(status.as_str());
    }
    if let Some(is_last) = query.is_last {
        q = q.bind(is_last);
    }

    Ok(q.fetch_all(&mut *conn).await?)
}

/// Processed analyses of a branch, minus any pinned as a new-code baseline.
///
/// A baseline pinned on the branch itself, or on the project (no branch),
/// protects the analysis.
pub async fn select_purgeable_analyses(
    conn: &mut SqliteConnection,
    branch_uuid: &str,
) -> DbResult<Vec<PurgeableAnalysis>> {
    let rows = sqlx::query(
        r#"
        SELECT
            s.uuid,
            s.created_at,
            s.islast,
            EXISTS (SELECT 1 FROM events e WHERE e.analysis_uuid = s.uuid) AS has_events,
            (
                SELECT e.name FROM events e
                WHERE e.analysis_uuid = s.uuid AND e.category = ?
                ORDER BY e.event_date DESC
                LIMIT 1
            ) AS version
        FROM snapshots s
        WHERE s.root_component_uuid = ?
          AND s.status = ?
          AND NOT EXISTS (
              SELECT 1 FROM new_code_periods ncp
              WHERE ncp.type = ?
                AND ncp.value = s.uuid
                AND (
                    ncp.branch_uuid = s.root_component_uuid
                    OR (
                        ncp.branch_uuid IS NULL
                        AND ncp.project_uuid = (
                            SELECT pb.project_uuid FROM project_branches pb
                            WHERE pb.uuid = s.root_component_uuid
                        )
                    )
                )
          )
        ORDER BY s.created_at, s.uuid
        "#,
    )
    .bind(VERSION_EVENT_CATEGORY)
    .bind(branch_uuid)
    .bind(AnalysisStatus::Processed.as_str())
    .bind(SPECIFIC_ANALYSIS)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(PurgeableAnalysis {
                uuid: row.try_get("uuid")?,
                date: from_millis(row.try_get("created_at")?)?,
                last: row.try_get("islast")?,
                has_events: row.try_get::<i64, _>("has_events")? != 0,
                version: row.try_get("version")?,
            })
        })
        .collect()
}

// ==================== Branches ====================

/// Non-main branches and pull requests of a project idle since before `cutoff`.
///
/// `exclude_from_purge` only protects plain branches.
pub async fn select_inactive_branches(
    conn: &mut SqliteConnection,
    project_uuid: &str,
    cutoff: DateTime<Utc>,
) -> DbResult<Vec<String>> {
    let uuids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT uuid FROM project_branches
        WHERE project_uuid = ?
          AND branch_type <> 'MAIN'
          AND (branch_type = 'PULL_REQUEST' OR exclude_from_purge = 0)
          AND updated_at < ?
        ORDER BY uuid
        "#,
    )
    .bind(project_uuid)
    .bind(to_millis(cutoff))
    .fetch_all(&mut *conn)
    .await?;

    Ok(uuids)
}

// ==================== Background tasks ====================

/// Terminal tasks of the scope created before `cutoff`. Queue rows never match.
pub async fn select_old_activity_uuids(
    conn: &mut SqliteConnection,
    scope: &[String],
    cutoff: DateTime<Utc>,
) -> DbResult<Vec<String>> {
    fetch_strings_chunked(
        conn,
        r#"
        SELECT uuid FROM ce_activity
        WHERE created_at < ?
          AND (entity_uuid IN ({ids}) OR component_uuid IN ({ids}))
        "#,
        &[to_millis(cutoff)],
        scope,
    )
    .await
}

/// Scanner contexts of terminal tasks of the scope, created before `cutoff`.
pub async fn select_old_scanner_context_uuids(
    conn: &mut SqliteConnection,
    scope: &[String],
    cutoff: DateTime<Utc>,
) -> DbResult<Vec<String>> {
    fetch_strings_chunked(
        conn,
        r#"
        SELECT sc.task_uuid FROM ce_scanner_context sc
        JOIN ce_activity a ON a.uuid = sc.task_uuid
        WHERE sc.created_at < ?
          AND (a.entity_uuid IN ({ids}) OR a.component_uuid IN ({ids}))
        "#,
        &[to_millis(cutoff)],
        scope,
    )
    .await
}

// ==================== Issues ====================

fn row_to_issue(row: &SqliteRow) -> DbResult<IssueRetentionRow> {
    let close_date: Option<i64> = row.try_get("issue_close_date")?;
    Ok(IssueRetentionRow {
        key: row.try_get("kee")?,
        component_uuid: row.try_get("component_uuid")?,
        status: row.try_get("status")?,
        resolution: row.try_get("resolution")?,
        close_date: close_date.map(from_millis).transpose()?,
        component_exists: row.try_get::<i64, _>("component_exists")? != 0,
    })
}

/// Issues of the scope that are orphaned, or closed before `closed_before`.
pub async fn select_orphan_and_old_closed_issues(
    conn: &mut SqliteConnection,
    scope: &[String],
    closed_before: Option<DateTime<Utc>>,
) -> DbResult<Vec<IssueRetentionRow>> {
    let sql = format!(
        r#"
        SELECT i.kee, i.component_uuid, i.status, i.resolution, i.issue_close_date,
               c.uuid IS NOT NULL AS component_exists
        FROM issues i
        LEFT JOIN components c ON c.uuid = i.component_uuid
        WHERE (c.uuid IS NULL OR (i.status = '{STATUS_CLOSED}' AND i.issue_close_date < ?))
          AND i.project_uuid IN ({{ids}})
        "#
    );
    let cutoff = closed_before.map(to_millis).unwrap_or(i64::MIN);
    let rows = fetch_rows_chunked(conn, &sql, &[cutoff], scope).await?;
    rows.iter().map(row_to_issue).collect()
}

/// Issues of the scope attached to any of `component_uuids`.
pub async fn select_issues_of_components(
    conn: &mut SqliteConnection,
    scope: &[String],
    component_uuids: &[String],
) -> DbResult<Vec<IssueRetentionRow>> {
    let rows = fetch_rows_chunked(
        conn,
        r#"
        SELECT i.kee, i.project_uuid, i.component_uuid, i.status, i.resolution,
               i.issue_close_date, c.uuid IS NOT NULL AS component_exists
        FROM issues i
        LEFT JOIN components c ON c.uuid = i.component_uuid
        WHERE i.component_uuid IN ({ids})
        "#,
        &[],
        component_uuids,
    )
    .await?;

    let scope: HashSet<&str> = scope.iter().map(String::as_str).collect();
    let mut issues = Vec::with_capacity(rows.len());
    for row in &rows {
        let project_uuid: String = row.try_get("project_uuid")?;
        if scope.contains(project_uuid.as_str()) {
            issues.push(row_to_issue(row)?);
        }
    }
    Ok(issues)
}

/// Close the given issues as removed. Issues already resolved are left as they are.
pub async fn close_issues(
    conn: &mut SqliteConnection,
    keys: &[String],
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let open = OPEN_STATUSES
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        r#"
        UPDATE issues
        SET status = '{STATUS_CLOSED}', resolution = '{RESOLUTION_REMOVED}',
            issue_close_date = ?, updated_at = ?
        WHERE status IN ({open}) AND resolution IS NULL AND kee IN ({{ids}})
        "#
    );
    let now = to_millis(now);
    execute_chunked(conn, &sql, &[now, now], keys).await
}

// ==================== Components ====================

/// Disabled, non-root components of a root that no issue points at anymore.
pub async fn select_disabled_components_without_issues(
    conn: &mut SqliteConnection,
    root_uuid: &str,
) -> DbResult<Vec<String>> {
    let uuids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT c.uuid FROM components c
        WHERE c.branch_uuid = ?
          AND c.enabled = 0
          AND c.uuid <> c.branch_uuid
          AND NOT EXISTS (SELECT 1 FROM issues i WHERE i.component_uuid = c.uuid)
        ORDER BY c.uuid
        "#,
    )
    .bind(root_uuid)
    .fetch_all(&mut *conn)
    .await?;

    Ok(uuids)
}
