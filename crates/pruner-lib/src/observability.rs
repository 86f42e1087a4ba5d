//! Observability for pruning runs
//!
//! Provides:
//! - Prometheus metrics describing the last run (machines seen, deletions requested)
//! - Structured JSON logging of run events with tracing
//!
//! The pruner is a short-lived job, so metrics are exported by writing the
//! text exposition to a file for a textfile collector to pick up.

use anyhow::{Context, Result};
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Encoder, Histogram,
    IntCounter, IntGauge, TextEncoder,
};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{error, info};

use crate::config::PruningConfig;
use crate::error::{CommandFailure, PrunerError};

/// Run duration buckets (in seconds); dominated by cluster command latency
const RUN_DURATION_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PrunerMetricsInner> = OnceLock::new();

struct PrunerMetricsInner {
    machines_listed: IntGauge,
    machines_deleting: IntGauge,
    machines_eligible: IntGauge,
    machines_planned: IntGauge,
    deletions_requested: IntCounter,
    deletion_failures: IntCounter,
    run_failures: IntCounter,
    last_run_timestamp_seconds: IntGauge,
    run_duration_seconds: Histogram,
}

impl PrunerMetricsInner {
    fn new() -> Self {
        Self {
            machines_listed: register_int_gauge!(
                "aged_machines_pruner_machines_listed",
                "Number of worker machines returned by the last listing"
            )
            .expect("Failed to register machines_listed"),

            machines_deleting: register_int_gauge!(
                "aged_machines_pruner_machines_deleting",
                "Number of machines in Deleting phase at the last listing"
            )
            .expect("Failed to register machines_deleting"),

            machines_eligible: register_int_gauge!(
                "aged_machines_pruner_machines_eligible",
                "Running machines over the maximum age in the last run, before the cap"
            )
            .expect("Failed to register machines_eligible"),

            machines_planned: register_int_gauge!(
                "aged_machines_pruner_machines_planned",
                "Number of machines selected for deletion in the last run"
            )
            .expect("Failed to register machines_planned"),

            deletions_requested: register_int_counter!(
                "aged_machines_pruner_deletions_requested_total",
                "Deletion requests submitted successfully (including dry runs)"
            )
            .expect("Failed to register deletions_requested"),

            deletion_failures: register_int_counter!(
                "aged_machines_pruner_deletion_failures_total",
                "Deletion requests that could not be submitted"
            )
            .expect("Failed to register deletion_failures"),

            run_failures: register_int_counter!(
                "aged_machines_pruner_run_failures_total",
                "Runs aborted by an error"
            )
            .expect("Failed to register run_failures"),

            last_run_timestamp_seconds: register_int_gauge!(
                "aged_machines_pruner_last_run_timestamp_seconds",
                "Unix time the last run finished"
            )
            .expect("Failed to register last_run_timestamp_seconds"),

            run_duration_seconds: register_histogram!(
                "aged_machines_pruner_run_duration_seconds",
                "Wall time of a pruning run",
                RUN_DURATION_BUCKETS.to_vec()
            )
            .expect("Failed to register run_duration_seconds"),
        }
    }
}

/// Handle to the process-wide pruner metrics
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct PrunerMetrics {
    _private: (),
}

impl Default for PrunerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PrunerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PrunerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PrunerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record the shape of the listed snapshot
    pub fn set_snapshot(&self, listed: usize, deleting: usize) {
        self.inner().machines_listed.set(listed as i64);
        self.inner().machines_deleting.set(deleting as i64);
    }

    /// Record the eligible count and the capped plan size
    pub fn set_plan(&self, eligible: usize, planned: usize) {
        self.inner().machines_eligible.set(eligible as i64);
        self.inner().machines_planned.set(planned as i64);
    }

    pub fn inc_deletions_requested(&self) {
        self.inner().deletions_requested.inc();
    }

    pub fn inc_deletion_failures(&self) {
        self.inner().deletion_failures.inc();
    }

    pub fn inc_run_failures(&self) {
        self.inner().run_failures.inc();
    }

    /// Mark the end of a run
    pub fn observe_run(&self, duration_secs: f64, finished_at: i64) {
        self.inner().run_duration_seconds.observe(duration_secs);
        self.inner().last_run_timestamp_seconds.set(finished_at);
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&prometheus::gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics exposition is not UTF-8")
    }

    /// Write the exposition atomically so a collector never reads a partial file
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let contents = self.encode_text()?;
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move metrics into {}", path.display()))?;
        Ok(())
    }
}

/// Structured logger for pruning run events
#[derive(Clone)]
pub struct StructuredLogger {
    namespace: String,
}

impl StructuredLogger {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Log the parameters a run executes with
    pub fn log_run_started(&self, version: &str, config: &PruningConfig) {
        info!(
            event = "run_started",
            namespace = %self.namespace,
            version = %version,
            max_age_hours = config.max_age_hours(),
            max_deleting_at_once = config.max_concurrent_deleting(),
            filter_labels = %config.label_selector(),
            dry_run = config.dry_run(),
            "Pruning run started"
        );
    }

    pub fn log_machines_listed(&self, total: usize, deleting: usize) {
        info!(
            event = "machines_listed",
            namespace = %self.namespace,
            total = total,
            deleting = deleting,
            "Worker machines listed"
        );
    }

    pub fn log_budget_exhausted(&self, deleting: usize, limit: usize) {
        info!(
            event = "budget_exhausted",
            namespace = %self.namespace,
            deleting = deleting,
            limit = limit,
            "Deleting machines limit exhausted, nothing will be marked for deletion"
        );
    }

    pub fn log_plan(&self, machines: &[String], dry_run: bool) {
        if machines.is_empty() {
            info!(
                event = "plan_computed",
                namespace = %self.namespace,
                planned = 0,
                "No machines marked for deletion"
            );
        } else {
            info!(
                event = "plan_computed",
                namespace = %self.namespace,
                planned = machines.len(),
                machines = %machines.join(", "),
                dry_run = dry_run,
                "Machines marked for deletion"
            );
        }
    }

    pub fn log_deletion_requested(&self, machine: &str, dry_run: bool) {
        info!(
            event = "deletion_requested",
            namespace = %self.namespace,
            machine = %machine,
            dry_run = dry_run,
            "Machine deletion requested"
        );
    }

    pub fn log_deletion_failed(&self, machine: &str, failure: &CommandFailure, dry_run: bool) {
        error!(
            event = "deletion_failed",
            namespace = %self.namespace,
            machine = %machine,
            dry_run = dry_run,
            command = %failure.command,
            stdout = %failure.stdout,
            stderr = %failure.stderr,
            code = ?failure.code,
            "Machine deletion request failed"
        );
    }

    pub fn log_run_finished(&self, deleted: usize, dry_run: bool, duration_secs: f64) {
        info!(
            event = "run_finished",
            namespace = %self.namespace,
            deletions_requested = deleted,
            dry_run = dry_run,
            duration_secs = duration_secs,
            "Pruning run finished"
        );
    }

    pub fn log_run_failed(&self, err: &PrunerError) {
        match err.command_failure() {
            Some(failure) => error!(
                event = "run_failed",
                namespace = %self.namespace,
                error = %err,
                command = %failure.command,
                stdout = %failure.stdout,
                stderr = %failure.stderr,
                code = ?failure.code,
                exit_code = err.exit_code(),
                "Pruning run aborted"
            ),
            None => error!(
                event = "run_failed",
                namespace = %self.namespace,
                error = %err,
                exit_code = err.exit_code(),
                "Pruning run aborted"
            ),
        }
    }
}
