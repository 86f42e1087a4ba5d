//! Single pruning pass: list → plan → delete
//!
//! Every failure is fatal for the run. Deletions already submitted are not
//! rolled back and remaining plan entries are not attempted; the next
//! scheduled invocation starts over from fresh cluster state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::cluster::{MachineDeleter, MachineRepository};
use crate::config::PruningConfig;
use crate::error::PrunerResult;
use crate::models::{DeletionPlan, MachineRecord};
use crate::observability::{PrunerMetrics, StructuredLogger};
use crate::policy;

/// Snapshot and the plan computed from it, without any deletion
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub evaluated_at: DateTime<Utc>,
    pub machines: Vec<MachineRecord>,
    pub deleting: usize,
    pub budget_exhausted: bool,
    pub plan: DeletionPlan,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub listed: usize,
    pub deleting: usize,
    pub plan: DeletionPlan,
    /// Machines whose deletion request was submitted, in order
    pub requested: Vec<String>,
    pub dry_run: bool,
}

/// Drives one pruning pass against a repository and a deleter
pub struct Pruner {
    repository: Arc<dyn MachineRepository>,
    deleter: Arc<dyn MachineDeleter>,
    config: PruningConfig,
    metrics: PrunerMetrics,
    logger: StructuredLogger,
}

impl Pruner {
    pub fn new(
        repository: Arc<dyn MachineRepository>,
        deleter: Arc<dyn MachineDeleter>,
        config: PruningConfig,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            repository,
            deleter,
            config,
            metrics: PrunerMetrics::new(),
            logger,
        }
    }

    pub fn config(&self) -> &PruningConfig {
        &self.config
    }

    /// List machines and compute the plan for `now`
    pub async fn evaluate(&self, now: DateTime<Utc>) -> PrunerResult<Evaluation> {
        let machines = self
            .repository
            .list_machines(self.config.label_selector())
            .await?;

        let deleting = machines.iter().filter(|m| m.is_deleting()).count();
        self.logger.log_machines_listed(machines.len(), deleting);
        self.metrics.set_snapshot(machines.len(), deleting);

        let budget_exhausted = deleting >= self.config.max_concurrent_deleting();
        if budget_exhausted {
            self.logger
                .log_budget_exhausted(deleting, self.config.max_concurrent_deleting());
        }

        let plan = policy::plan(&machines, &self.config, now)?;
        self.metrics.set_plan(plan.eligible(), plan.len());

        Ok(Evaluation {
            evaluated_at: now,
            deleting,
            budget_exhausted,
            machines,
            plan,
        })
    }

    /// Evaluate and submit the resulting deletions
    pub async fn run(&self, now: DateTime<Utc>) -> PrunerResult<RunReport> {
        let started = Instant::now();
        let result = self.run_inner(now).await;
        let elapsed = started.elapsed().as_secs_f64();
        self.metrics.observe_run(elapsed, Utc::now().timestamp());

        match &result {
            Ok(report) => {
                self.logger
                    .log_run_finished(report.requested.len(), report.dry_run, elapsed)
            }
            Err(err) => {
                self.metrics.inc_run_failures();
                self.logger.log_run_failed(err);
            }
        }

        result
    }

    async fn run_inner(&self, now: DateTime<Utc>) -> PrunerResult<RunReport> {
        let evaluation = self.evaluate(now).await?;
        let dry_run = self.config.dry_run();
        self.logger.log_plan(evaluation.plan.machines(), dry_run);

        if dry_run && !evaluation.plan.is_empty() {
            warn!("DRY_RUN is enabled, deletions will be simulated only");
        }

        let mut requested = Vec::with_capacity(evaluation.plan.len());
        for name in evaluation.plan.iter() {
            info!(machine = %name, "Trying to delete machine");
            if let Err(err) = self.deleter.delete_machine(name, dry_run).await {
                self.metrics.inc_deletion_failures();
                if let Some(failure) = err.command_failure() {
                    self.logger.log_deletion_failed(name, failure, dry_run);
                }
                return Err(err);
            }
            self.metrics.inc_deletions_requested();
            self.logger.log_deletion_requested(name, dry_run);
            requested.push(name.to_string());
        }

        Ok(RunReport {
            listed: evaluation.machines.len(),
            deleting: evaluation.deleting,
            plan: evaluation.plan,
            requested,
            dry_run,
        })
    }
}
