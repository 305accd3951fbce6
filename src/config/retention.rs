//! Housekeeping retention configuration.
//!
//! These values are the defaults every purge run is built from; a
//! [`PurgeConfiguration`](crate::purge::PurgeConfiguration) is derived from
//! them for each root.
//!
//! # Example
//!
//! ```toml
//! [retention]
//! max_analysis_age_days = 260
//! closed_issue_max_age_days = 30
//! inactive_branch_max_age_days = 30
//! ce_activity_max_age_days = 180
//! scanner_context_max_age_days = 28
//!
//! [retention.thinning]
//! hours_before_keeping_one_per_day = 24
//! weeks_before_keeping_one_per_week = 4
//! weeks_before_keeping_one_per_month = 52
//! weeks_before_keeping_only_with_version = 104
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Longest retention period accepted, in days (about a century).
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Longest thinning window accepted, in weeks.
pub const MAX_THINNING_WEEKS: u32 = MAX_RETENTION_DAYS / 7;

/// Housekeeping retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Days after which every analysis except the last one is deleted.
    /// Default: 1820 (260 weeks)
    #[serde(default = "default_max_analysis_age_days")]
    pub max_analysis_age_days: u32,

    /// Days to keep closed issues before hard deleting them.
    /// Set to 0 to keep closed issues forever.
    /// Default: 30
    #[serde(default = "default_closed_issue_max_age_days")]
    pub closed_issue_max_age_days: u32,

    /// Days without activity after which branches and pull requests are deleted.
    /// Set to 0 to disable the sweep.
    /// Default: 30
    #[serde(default = "default_inactive_branch_max_age_days")]
    pub inactive_branch_max_age_days: u32,

    /// Days to keep finished background task records.
    /// Default: 180
    #[serde(default = "default_ce_activity_max_age_days")]
    pub ce_activity_max_age_days: u32,

    /// Days to keep scanner context payloads of finished tasks.
    /// Default: 28
    #[serde(default = "default_scanner_context_max_age_days")]
    pub scanner_context_max_age_days: u32,

    /// Progressive thinning of analysis history.
    #[serde(default)]
    pub thinning: ThinningSettings,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_analysis_age_days: default_max_analysis_age_days(),
            closed_issue_max_age_days: default_closed_issue_max_age_days(),
            inactive_branch_max_age_days: default_inactive_branch_max_age_days(),
            ce_activity_max_age_days: default_ce_activity_max_age_days(),
            scanner_context_max_age_days: default_scanner_context_max_age_days(),
            thinning: ThinningSettings::default(),
        }
    }
}

fn default_max_analysis_age_days() -> u32 {
    260 * 7
}

fn default_closed_issue_max_age_days() -> u32 {
    30
}

fn default_inactive_branch_max_age_days() -> u32 {
    30
}

fn default_ce_activity_max_age_days() -> u32 {
    180
}

fn default_scanner_context_max_age_days() -> u32 {
    28
}

/// Thresholds of the analysis thinning filters.
///
/// Analyses younger than `hours_before_keeping_one_per_day` are all kept;
/// older ones are thinned to one per day, then one per week, then one per
/// month, until `max_analysis_age_days` deletes everything but the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThinningSettings {
    /// Default: 24
    #[serde(default = "default_hours_before_keeping_one_per_day")]
    pub hours_before_keeping_one_per_day: u32,

    /// Default: 4
    #[serde(default = "default_weeks_before_keeping_one_per_week")]
    pub weeks_before_keeping_one_per_week: u32,

    /// Default: 52
    #[serde(default = "default_weeks_before_keeping_one_per_month")]
    pub weeks_before_keeping_one_per_month: u32,

    /// Analyses older than this without a version event are deleted.
    /// Default: 104
    #[serde(default = "default_weeks_before_keeping_only_with_version")]
    pub weeks_before_keeping_only_with_version: u32,
}

impl Default for ThinningSettings {
    fn default() -> Self {
        Self {
            hours_before_keeping_one_per_day: default_hours_before_keeping_one_per_day(),
            weeks_before_keeping_one_per_week: default_weeks_before_keeping_one_per_week(),
            weeks_before_keeping_one_per_month: default_weeks_before_keeping_one_per_month(),
            weeks_before_keeping_only_with_version:
                default_weeks_before_keeping_only_with_version(),
        }
    }
}

fn default_hours_before_keeping_one_per_day() -> u32 {
    24
}

fn default_weeks_before_keeping_one_per_week() -> u32 {
    4
}

fn default_weeks_before_keeping_one_per_month() -> u32 {
    52
}

fn default_weeks_before_keeping_only_with_version() -> u32 {
    104
}

impl ThinningSettings {
    /// Check that the thinning windows are ordered from newest to oldest.
    pub fn validate(&self) -> Result<(), String> {
        let week_hours = u64::from(self.weeks_before_keeping_one_per_week) * 7 * 24;
        if u64::from(self.hours_before_keeping_one_per_day) > week_hours {
            return Err(format!(
                "hours_before_keeping_one_per_day ({}) exceeds weeks_before_keeping_one_per_week ({})",
                self.hours_before_keeping_one_per_day, self.weeks_before_keeping_one_per_week
            ));
        }
        if self.weeks_before_keeping_one_per_week > self.weeks_before_keeping_one_per_month {
            return Err(format!(
                "weeks_before_keeping_one_per_week ({}) exceeds weeks_before_keeping_one_per_month ({})",
                self.weeks_before_keeping_one_per_week, self.weeks_before_keeping_one_per_month
            ));
        }
        for (name, weeks) in [
            (
                "weeks_before_keeping_one_per_month",
                self.weeks_before_keeping_one_per_month,
            ),
            (
                "weeks_before_keeping_only_with_version",
                self.weeks_before_keeping_only_with_version,
            ),
        ] {
            if weeks > MAX_THINNING_WEEKS {
                return Err(format!("{name} ({weeks}) exceeds {MAX_THINNING_WEEKS} weeks"));
            }
        }
        Ok(())
    }
}

impl RetentionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_analysis_age_days == 0 {
            return Err(ConfigError::Validation(
                "retention.max_analysis_age_days must be at least 1".into(),
            ));
        }
        if self.ce_activity_max_age_days == 0 || self.scanner_context_max_age_days == 0 {
            return Err(ConfigError::Validation(
                "retention background task periods must be at least 1 day".into(),
            ));
        }
        for (name, days) in [
            ("max_analysis_age_days", self.max_analysis_age_days),
            ("closed_issue_max_age_days", self.closed_issue_max_age_days),
            ("inactive_branch_max_age_days", self.inactive_branch_max_age_days),
            ("ce_activity_max_age_days", self.ce_activity_max_age_days),
            ("scanner_context_max_age_days", self.scanner_context_max_age_days),
        ] {
            if days > MAX_RETENTION_DAYS {
                return Err(ConfigError::Validation(format!(
                    "retention.{name} ({days}) exceeds {MAX_RETENTION_DAYS} days"
                )));
            }
        }
        self.thinning.validate().map_err(ConfigError::Validation)
    }

    /// Closed-issue retention, `None` when closed issues are kept forever.
    pub fn closed_issue_max_age(&self) -> Option<u32> {
        (self.closed_issue_max_age_days > 0).then_some(self.closed_issue_max_age_days)
    }

    /// Inactive branch retention, `None` when the sweep is disabled.
    pub fn inactive_branch_max_age(&self) -> Option<u32> {
        (self.inactive_branch_max_age_days > 0).then_some(self.inactive_branch_max_age_days)
    }
}
