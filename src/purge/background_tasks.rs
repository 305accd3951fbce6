//! Age-based retention of finished background tasks.
//!
//! Queued tasks are never selected here; they only go when their entity is
//! deleted.

use sqlx::SqliteConnection;

use super::{commands::PurgeCommands, evaluator::RetentionPolicyEvaluator};
use crate::db::DbResult;

/// Delete finished tasks past their retention, and scanner contexts past
/// their own shorter one.
pub async fn purge_old_background_tasks(
    conn: &mut SqliteConnection,
    commands: &mut PurgeCommands,
    evaluator: &RetentionPolicyEvaluator<'_>,
    scope: &[String],
) -> DbResult<()> {
    let old = evaluator.select_old_background_tasks(conn, scope).await?;

    commands
        .delete_scanner_contexts(conn, &old.scanner_contexts)
        .await?;
    commands.delete_activities(conn, &old.activities).await?;

    if !old.activities.is_empty() || !old.scanner_contexts.is_empty() {
        tracing::debug!(
            activities = old.activities.len(),
            scanner_contexts = old.scanner_contexts.len(),
            "Purged old background tasks"
        );
    }
    Ok(())
}
