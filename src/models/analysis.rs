use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of an analysis (`snapshots.status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    /// Report received but never fully processed
    #[serde(rename = "U")]
    Unprocessed,
    #[serde(rename = "P")]
    Processed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Unprocessed => "U",
            AnalysisStatus::Processed => "P",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event category whose name carries the analysed project version.
pub const VERSION_EVENT_CATEGORY: &str = "Version";

/// Processed analysis of a branch that retention may consider removing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeableAnalysis {
    pub uuid: String,
    pub date: DateTime<Utc>,
    /// The branch's current analysis. Never physically purged.
    pub last: bool,
    pub has_events: bool,
    /// Name of the analysis' VERSION event, if any. Other event categories never set it.
    pub version: Option<String>,
}

impl PurgeableAnalysis {
    /// Neither the current analysis nor one that carries events.
    pub fn is_thinnable(&self) -> bool {
        !self.last && !self.has_events
    }
}
