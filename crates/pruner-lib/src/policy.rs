//! Age-based pruning policy
//!
//! Decides which worker machines to delete in a single run:
//!
//! ```text
//! deleting = machines in phase Deleting
//! if |deleting| >= max_concurrent_deleting:
//!     plan = []                                  // budget exhausted
//! else:
//!     eligible = Running machines with age_hours > max_age_hours
//!     plan     = first max_concurrent_deleting of eligible, input order
//! ```
//!
//! The truncation applies the full cap again and is not reduced by the
//! machines already deleting: with a cap of 2 and one machine deleting, two
//! more may be selected.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::PruningConfig;
use crate::error::{PrunerError, PrunerResult};
use crate::models::{DeletionPlan, MachineRecord};

/// Compute the deletion plan for a machine snapshot
pub fn plan(
    machines: &[MachineRecord],
    config: &PruningConfig,
    now: DateTime<Utc>,
) -> PrunerResult<DeletionPlan> {
    ensure_unique_names(machines)?;

    let deleting: Vec<&str> = machines
        .iter()
        .filter(|m| m.is_deleting())
        .map(|m| m.name.as_str())
        .collect();

    if deleting.is_empty() {
        info!("No machines in deleting phase");
    } else {
        info!(
            deleting = ?deleting,
            total = deleting.len(),
            "Machines in deleting phase"
        );
        if deleting.len() >= config.max_concurrent_deleting() {
            info!(
                limit = config.max_concurrent_deleting(),
                "Deleting machines limit exhausted, nothing will be marked for deletion"
            );
            return Ok(DeletionPlan::empty());
        }
    }

    let eligible: Vec<&MachineRecord> = machines
        .iter()
        .filter(|m| m.is_running() && m.age_hours(now) > config.max_age_hours())
        .collect();

    for machine in &eligible {
        debug!(
            machine = %machine.name,
            age_hours = machine.age_hours(now),
            "Machine exceeds max age"
        );
    }

    info!(
        eligible = eligible.len(),
        limit = config.max_concurrent_deleting(),
        "Machines found for deletion"
    );

    let total = eligible.len();
    Ok(DeletionPlan::truncated(
        eligible
            .into_iter()
            .take(config.max_concurrent_deleting())
            .map(|m| m.name.clone())
            .collect(),
        total,
    ))
}

fn ensure_unique_names(machines: &[MachineRecord]) -> PrunerResult<()> {
    let mut seen = HashSet::with_capacity(machines.len());
    for machine in machines {
        if !seen.insert(machine.name.as_str()) {
            return Err(PrunerError::InvalidRecord(format!(
                "machine {} listed more than once",
                machine.name
            )));
        }
    }
    Ok(())
}
