use serde::{Deserialize, Serialize};

use super::error::{PurgeError, PurgeResult};
use crate::config::{MAX_RETENTION_DAYS, RetentionConfig, ThinningSettings};

/// Immutable policy of a single purge call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeConfiguration {
    /// Branch or portfolio being purged
    pub root_uuid: String,
    /// Project owning the root (equal to the root for portfolios)
    pub project_uuid: String,
    /// Every analysis but the last is deleted past this age
    pub max_analysis_age_days: u32,
    /// `None` keeps closed issues forever
    pub closed_issue_max_age_days: Option<u32>,
    /// `None` disables the stale branch sweep
    pub inactive_branch_max_age_days: Option<u32>,
    /// Components whose open issues are closed by this purge
    pub disabled_component_uuids: Vec<String>,
    pub scanner_context_max_age_days: u32,
    pub ce_activity_max_age_days: u32,
    pub thinning: ThinningSettings,
}

impl PurgeConfiguration {
    /// Build the configuration of one purge from the housekeeping settings.
    pub fn from_settings(
        root_uuid: impl Into<String>,
        project_uuid: impl Into<String>,
        disabled_component_uuids: Vec<String>,
        settings: &RetentionConfig,
    ) -> Self {
        Self {
            root_uuid: root_uuid.into(),
            project_uuid: project_uuid.into(),
            max_analysis_age_days: settings.max_analysis_age_days,
            closed_issue_max_age_days: settings.closed_issue_max_age(),
            inactive_branch_max_age_days: settings.inactive_branch_max_age(),
            disabled_component_uuids,
            scanner_context_max_age_days: settings.scanner_context_max_age_days,
            ce_activity_max_age_days: settings.ce_activity_max_age_days,
            thinning: settings.thinning,
        }
    }

    /// Reject malformed policies before anything touches storage.
    pub fn validate(&self) -> PurgeResult<()> {
        if self.root_uuid.trim().is_empty() {
            return Err(invalid("root uuid is empty"));
        }
        if self.project_uuid.trim().is_empty() {
            return Err(invalid("project uuid is empty"));
        }
        if self.max_analysis_age_days == 0 {
            return Err(invalid("max analysis age must be at least 1 day"));
        }
        if self.closed_issue_max_age_days == Some(0) {
            return Err(invalid("closed issue max age must be at least 1 day when set"));
        }
        if self.inactive_branch_max_age_days == Some(0) {
            return Err(invalid("inactive branch max age must be at least 1 day when set"));
        }
        if self.scanner_context_max_age_days == 0 {
            return Err(invalid("scanner context max age must be at least 1 day"));
        }
        if self.ce_activity_max_age_days == 0 {
            return Err(invalid("background task max age must be at least 1 day"));
        }
        let ages = [
            Some(self.max_analysis_age_days),
            self.closed_issue_max_age_days,
            self.inactive_branch_max_age_days,
            Some(self.scanner_context_max_age_days),
            Some(self.ce_activity_max_age_days),
        ];
        if ages.into_iter().flatten().any(|days| days > MAX_RETENTION_DAYS) {
            return Err(PurgeError::InvalidConfiguration(format!(
                "retention periods are limited to {MAX_RETENTION_DAYS} days"
            )));
        }
        if self.disabled_component_uuids.iter().any(|u| u.trim().is_empty()) {
            return Err(invalid("disabled component uuids contain an empty value"));
        }
        self.thinning
            .validate()
            .map_err(PurgeError::InvalidConfiguration)
    }
}

fn invalid(message: &str) -> PurgeError {
    PurgeError::InvalidConfiguration(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PurgeConfiguration {
        PurgeConfiguration::from_settings(
            "branch-1",
            "project-1",
            vec![],
            &RetentionConfig::default(),
        )
    }

    #[test]
    fn test_from_settings_copies_defaults() {
        let config = config();
        assert_eq!(config.root_uuid, "branch-1");
        assert_eq!(config.project_uuid, "project-1");
        assert_eq!(config.max_analysis_age_days, 1820);
        assert_eq!(config.closed_issue_max_age_days, Some(30));
        assert_eq!(config.inactive_branch_max_age_days, Some(30));
        assert_eq!(config.ce_activity_max_age_days, 180);
        assert_eq!(config.scanner_context_max_age_days, 28);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_in_settings_disables_optional_rules() {
        let settings = RetentionConfig {
            closed_issue_max_age_days: 0,
            inactive_branch_max_age_days: 0,
            ..Default::default()
        };
        let config = PurgeConfiguration::from_settings("b", "p", vec![], &settings);
        assert_eq!(config.closed_issue_max_age_days, None);
        assert_eq!(config.inactive_branch_max_age_days, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_root() {
        let config = PurgeConfiguration {
            root_uuid: " ".into(),
            ..config()
        };
        assert!(matches!(config.validate(), Err(PurgeError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_rejects_zero_ages() {
        for config in [
            PurgeConfiguration {
                max_analysis_age_days: 0,
                ..config()
            },
            PurgeConfiguration {
                closed_issue_max_age_days: Some(0),
                ..config()
            },
            PurgeConfiguration {
                inactive_branch_max_age_days: Some(0),
                ..config()
            },
            PurgeConfiguration {
                scanner_context_max_age_days: 0,
                ..config()
            },
            PurgeConfiguration {
                ce_activity_max_age_days: 0,
                ..config()
            },
        ] {
            assert!(matches!(config.validate(), Err(PurgeError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_rejects_ages_beyond_a_century() {
        for config in [
            PurgeConfiguration {
                max_analysis_age_days: 100_000_000,
                ..config()
            },
            PurgeConfiguration {
                closed_issue_max_age_days: Some(MAX_RETENTION_DAYS + 1),
                ..config()
            },
            PurgeConfiguration {
                thinning: ThinningSettings {
                    weeks_before_keeping_only_with_version: u32::MAX,
                    ..ThinningSettings::default()
                },
                ..config()
            },
        ] {
            assert!(matches!(config.validate(), Err(PurgeError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_rejects_blank_disabled_component() {
        let config = PurgeConfiguration {
            disabled_component_uuids: vec!["c1".into(), "".into()],
            ..config()
        };
        assert!(config.validate().is_err());
    }
}
