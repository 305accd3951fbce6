use chrono::{DateTime, Utc};

pub const STATUS_OPEN: &str = "OPEN";
pub const STATUS_CONFIRMED: &str = "CONFIRMED";
pub const STATUS_REOPENED: &str = "REOPENED";
pub const STATUS_RESOLVED: &str = "RESOLVED";
pub const STATUS_CLOSED: &str = "CLOSED";

pub const RESOLUTION_REMOVED: &str = "REMOVED";

/// Statuses an issue can be closed from when its component is disabled.
pub const OPEN_STATUSES: [&str; 3] = [STATUS_OPEN, STATUS_CONFIRMED, STATUS_REOPENED];

/// The subset of an issue row retention decisions are made on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRetentionRow {
    pub key: String,
    pub component_uuid: String,
    pub status: String,
    pub resolution: Option<String>,
    pub close_date: Option<DateTime<Utc>>,
    /// Whether `component_uuid` still exists in the component table
    pub component_exists: bool,
}

impl IssueRetentionRow {
    pub fn is_open(&self) -> bool {
        self.resolution.is_none() && OPEN_STATUSES.contains(&self.status.as_str())
    }

    pub fn is_closed(&self) -> bool {
        self.status == STATUS_CLOSED
    }
}
