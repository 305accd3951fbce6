use std::time::{Duration, Instant};

/// Phase timings of a single engine call.
///
/// Only ever reported at debug level.
#[derive(Debug, Default)]
pub struct PurgeProfiler {
    phases: Vec<(String, Duration)>,
    current: Option<(String, Instant)>,
}

impl PurgeProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a phase. A phase still running is stopped first.
    pub fn start(&mut self, phase: &str) {
        self.stop();
        self.current = Some((phase.to_string(), Instant::now()));
    }

    pub fn stop(&mut self) {
        if let Some((phase, started)) = self.current.take() {
            self.record(&phase, started.elapsed());
        }
    }

    /// Add a duration to a phase, summing repeated phases.
    pub fn record(&mut self, phase: &str, elapsed: Duration) {
        match self.phases.iter_mut().find(|(name, _)| name == phase) {
            Some((_, total)) => *total += elapsed,
            None => self.phases.push((phase.to_string(), elapsed)),
        }
    }

    pub fn phases(&self) -> &[(String, Duration)] {
        &self.phases
    }

    pub fn total(&self) -> Duration {
        self.phases.iter().map(|(_, d)| *d).sum()
    }

    pub fn log_summary(&self, operation: &str) {
        for (phase, elapsed) in &self.phases {
            tracing::debug!(
                operation,
                phase = %phase,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "Purge phase timing"
            );
        }
        tracing::debug!(
            operation,
            total_ms = self.total().as_secs_f64() * 1000.0,
            "Purge profiling complete"
        );
    }
}
