//! Prometheus metrics for purge runs.
//!
//! Provides metrics for:
//! - Purge and deletion runs by operation and outcome
//! - Rows deleted per cascade step

#[cfg(feature = "prometheus")]
use std::sync::OnceLock;

#[cfg(feature = "prometheus")]
use metrics::counter;
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Global Prometheus handle used to render the exposition.
#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system with the given configuration.
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(MetricsError::Install)?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::Setup("Metrics already initialized".to_string()))?;

    Ok(())
}

/// Initialize the metrics system (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if config.enabled && config.textfile.is_some() {
        tracing::warn!(
            "metrics.textfile is configured but the 'prometheus' feature is not compiled. \
            Rebuild with: cargo build --features prometheus"
        );
    }
    Ok(())
}

/// Write the current exposition to the configured textfile, if any.
#[cfg(feature = "prometheus")]
pub fn flush_textfile(config: &MetricsConfig) -> Result<(), MetricsError> {
    let (Some(path), Some(handle)) = (&config.textfile, PROMETHEUS_HANDLE.get()) else {
        return Ok(());
    };
    std::fs::write(path, handle.render()).map_err(|e| MetricsError::Setup(e.to_string()))
}

/// Write the current exposition (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn flush_textfile(_config: &MetricsConfig) -> Result<(), MetricsError> {
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Metric Recording Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Record a finished engine operation.
///
/// # Arguments
/// * `operation` - The entry point (e.g., "purge", "delete_project", "delete_branch")
/// * `outcome` - "success" or "error"
pub fn record_purge_run(operation: &str, outcome: &str) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "purge_runs_total",
            "operation" => operation.to_string(),
            "outcome" => outcome.to_string()
        )
        .increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (operation, outcome);
    }
}

/// Record rows removed or updated by one cascade step.
///
/// Useful for alerting on unexpected deletion volumes.
pub fn record_rows_deleted(step: &str, count: u64) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "purge_rows_deleted_total",
            "step" => step.to_string()
        )
        .increment(count);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (step, count);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to set up metrics: {0}")]
    Setup(String),

    #[cfg(feature = "prometheus")]
    #[error("Failed to install metrics recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}
