//! Metrics recording abstraction for migration runs.

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;

/// How a migration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Files changed and a pull request was proposed.
    Proposed,
    NoChange,
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Proposed => "proposed",
            RunOutcome::NoChange => "no_change",
            RunOutcome::Failed => "failed",
        }
    }
}

/// Abstraction for recording migration metrics.
///
/// Implementations must be thread-safe; one instance is shared by all requests.
pub trait MigrationMetrics: Send + Sync {
    /// Records one finished run of `migration`.
    fn record_run(&self, migration: &str, outcome: RunOutcome, duration_ms: u64);
}

/// Prometheus metrics collector.
///
/// # Metrics
/// - `migration_runs_total{migration, outcome}` (Counter)
/// - `migration_duration_seconds{migration}` (Histogram)
pub struct PrometheusMigrationMetrics {
    runs: IntCounterVec,
    duration: HistogramVec,
}

impl PrometheusMigrationMetrics {
    /// Creates the collectors and registers them with `registry`.
    ///
    /// # Errors
    /// Fails if metrics with the same names are already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let runs = IntCounterVec::new(
            Opts::new("migration_runs_total", "Number of migration runs"),
            &["migration", "outcome"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "migration_duration_seconds",
                "Duration of migration runs in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
            &["migration"],
        )?;

        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self { runs, duration })
    }
}

impl MigrationMetrics for PrometheusMigrationMetrics {
    fn record_run(&self, migration: &str, outcome: RunOutcome, duration_ms: u64) {
        self.runs
            .with_label_values(&[migration, outcome.as_str()])
            .inc();
        self.duration
            .with_label_values(&[migration])
            .observe(duration_ms as f64 / 1000.0);
    }
}

/// No-op metrics implementation for tests or when metrics are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMigrationMetrics;

impl NoOpMigrationMetrics {
    pub fn new() -> Self {
        Self
    }
}

impl MigrationMetrics for NoOpMigrationMetrics {
    fn record_run(&self, _migration: &str, _outcome: RunOutcome, _duration_ms: u64) {}
}
