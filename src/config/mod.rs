//! Configuration module for the purge engine.
//!
//! The engine is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [database]
//! type = "sqlite"
//! path = "${PURGE_DATA_DIR}/analysis.db"
//!
//! [retention]
//! closed_issue_max_age_days = 30
//! ```

mod database;
mod observability;
mod retention;

use std::path::Path;

pub use database::*;
pub use observability::*;
pub use retention::*;
use serde::{Deserialize, Serialize};

/// Root configuration for the purge engine.
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Database holding the analysis history.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Housekeeping retention defaults.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Observability configuration (logging, metrics).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: EngineConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.retention.validate()?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand `${VAR}` references, leaving anything after a `#` comment alone.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::Validation(format!("invalid interpolation pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let Some(whole) = cap.get(0) else { continue };

            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            result.push_str(&value);

            last_end = whole.end();
        }

        result.push_str(&line[last_end..]);
        result.push('\n');
    }

    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_empty_config() {
        let config = EngineConfig::from_str("").unwrap();
        assert!(config.database.is_none());
        assert_eq!(config.retention.closed_issue_max_age(), Some(30));
    }

    #[test]
    fn test_full_config() {
        let config = EngineConfig::from_str(
            r#"
            [database]
            type = "sqlite"
            path = ":memory:"

            [retention]
            max_analysis_age_days = 400
            closed_issue_max_age_days = 0

            [observability.logging]
            level = "debug"
        "#,
        )
        .unwrap();

        assert!(matches!(config.database, DatabaseConfig::Sqlite(_)));
        assert_eq!(config.retention.max_analysis_age_days, 400);
        assert_eq!(config.retention.closed_issue_max_age(), None);
        assert_eq!(config.observability.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result = EngineConfig::from_str(
            r#"
            [server]
            port = 8080
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_retention_rejected() {
        let result = EngineConfig::from_str(
            r#"
            [retention]
            ce_activity_max_age_days = 0
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("TEST_PURGE_DB_PATH", Some("/var/lib/purge.db"), || {
            let config = EngineConfig::from_str(
                r#"
                [database]
                type = "sqlite"
                path = "${TEST_PURGE_DB_PATH}"
            "#,
            )
            .unwrap();
            match config.database {
                DatabaseConfig::Sqlite(c) => assert_eq!(c.path, "/var/lib/purge.db"),
                DatabaseConfig::None => panic!("expected sqlite config"),
            }
        });
    }

    #[test]
    fn test_missing_env_var() {
        temp_env::with_var_unset("TEST_PURGE_MISSING", || {
            let result = expand_env_vars("path = \"${TEST_PURGE_MISSING}\"");
            assert!(matches!(
                result,
                Err(ConfigError::EnvVarNotFound(v)) if v == "TEST_PURGE_MISSING"
            ));
        });
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let input = "# path = \"${NOT_SET_ANYWHERE}\"";
        assert_eq!(expand_env_vars(input).unwrap(), input);
    }

    #[test]
    fn test_env_var_before_comment_expanded() {
        temp_env::with_var("TEST_BEFORE_COMMENT", Some("expanded"), || {
            let result = expand_env_vars("key = \"${TEST_BEFORE_COMMENT}\" # ${IGNORED}").unwrap();
            assert_eq!(result, "key = \"expanded\" # ${IGNORED}");
        });
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [retention]
            scanner_context_max_age_days = 14
        "#
        )
        .unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.retention.scanner_context_max_age_days, 14);
    }

    #[test]
    fn test_from_missing_file() {
        let result = EngineConfig::from_file("/nonexistent/purge.toml");
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
    }
}
