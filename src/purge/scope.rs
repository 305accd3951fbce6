//! Resolution of the identifiers an operation may touch.
//!
//! Read-only. Unknown ids resolve to empty sets rather than errors so that
//! purging an already-deleted entity is a no-op.

use sqlx::SqliteConnection;

use super::steps::TargetIds;
use crate::db::{DbResult, sqlite::purge_mapper};

/// The root plus the sub-portfolios under it.
///
/// Directories, files and project copies are not part of the subtree: they
/// go with the component tree of the root.
pub async fn resolve_project_subtree(
    conn: &mut SqliteConnection,
    root_uuid: &str,
) -> DbResult<Vec<String>> {
    purge_mapper::select_root_and_subviews(conn, root_uuid).await
}

/// Every branch and pull request of a project.
pub async fn resolve_branch_family(
    conn: &mut SqliteConnection,
    project_uuid: &str,
) -> DbResult<Vec<String>> {
    purge_mapper::select_branch_uuids_by_project(conn, project_uuid).await
}

/// Deletion scope of a single root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeScope {
    pub root_uuid: String,
    /// Starts with the root, even when its component row is already gone
    pub root_and_subviews: Vec<String>,
}

impl PurgeScope {
    pub async fn resolve(conn: &mut SqliteConnection, root_uuid: &str) -> DbResult<Self> {
        let subtree = resolve_project_subtree(conn, root_uuid).await?;
        Ok(Self::from_subtree(root_uuid, subtree))
    }

    fn from_subtree(root_uuid: &str, subtree: Vec<String>) -> Self {
        let mut root_and_subviews = vec![root_uuid.to_string()];
        root_and_subviews.extend(subtree.into_iter().filter(|uuid| uuid != root_uuid));
        Self {
            root_uuid: root_uuid.to_string(),
            root_and_subviews,
        }
    }

    pub fn targets(&self) -> TargetIds {
        TargetIds {
            root: vec![self.root_uuid.clone()],
            root_and_subviews: self.root_and_subviews.clone(),
        }
    }
}
