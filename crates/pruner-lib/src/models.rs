//! Core data models for the machine pruner

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{PrunerError, PrunerResult};

/// Timestamp layout reported for `metadata.creationTimestamp`
pub const CREATION_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Lifecycle phase of a machine, as far as pruning is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachinePhase {
    Running,
    Deleting,
    /// Any other reported phase (Provisioning, Failed, ...), never actionable
    Other(String),
}

impl MachinePhase {
    pub fn as_str(&self) -> &str {
        match self {
            MachinePhase::Running => "Running",
            MachinePhase::Deleting => "Deleting",
            MachinePhase::Other(raw) => raw,
        }
    }
}

impl From<&str> for MachinePhase {
    fn from(raw: &str) -> Self {
        match raw {
            "Running" => MachinePhase::Running,
            "Deleting" => MachinePhase::Deleting,
            other => MachinePhase::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MachinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MachinePhase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A cluster-API machine as seen by the pruner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineRecord {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub phase: MachinePhase,
}

impl MachineRecord {
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>, phase: MachinePhase) -> Self {
        Self {
            name: name.into(),
            created_at,
            phase,
        }
    }

    /// Build a record from raw listing fields, validating the timestamp
    pub fn parse(name: &str, created: &str, phase: &str) -> PrunerResult<Self> {
        if name.is_empty() {
            return Err(PrunerError::InvalidRecord(
                "machine with empty name".to_string(),
            ));
        }

        let created_at = parse_creation_timestamp(created).map_err(|e| {
            PrunerError::InvalidRecord(format!(
                "machine {}: malformed creation timestamp {:?}: {}",
                name, created, e
            ))
        })?;

        Ok(Self::new(name, created_at, MachinePhase::from(phase)))
    }

    /// Age in hours at `now`; negative when the creation time lies in the future
    ///
    /// Whole seconds only: creation timestamps carry no fraction, so the
    /// sub-second part of `now` is dropped.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_seconds() as f64 / 3600.0
    }

    pub fn is_running(&self) -> bool {
        self.phase == MachinePhase::Running
    }

    pub fn is_deleting(&self) -> bool {
        self.phase == MachinePhase::Deleting
    }
}

/// Parse an exact `YYYY-MM-DDTHH:MM:SSZ` timestamp as UTC
pub fn parse_creation_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, CREATION_TIMESTAMP_FORMAT).map(|dt| dt.and_utc())
}

/// Ordered machine names selected for deletion in one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionPlan {
    machines: Vec<String>,
    /// Over-age running machines before the cap was applied
    eligible: usize,
}

impl DeletionPlan {
    pub fn new(machines: Vec<String>) -> Self {
        let eligible = machines.len();
        Self { machines, eligible }
    }

    /// Plan cut down from a larger eligible set
    pub fn truncated(machines: Vec<String>, eligible: usize) -> Self {
        Self {
            eligible: eligible.max(machines.len()),
            machines,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn machines(&self) -> &[String] {
        &self.machines
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn eligible(&self) -> usize {
        self.eligible
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.machines.iter().map(String::as_str)
    }
}
