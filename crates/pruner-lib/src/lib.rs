//! Library for pruning aged cluster-API worker machines
//!
//! This crate provides the core functionality for:
//! - Decoding machine listings into typed records
//! - The age and deletion-budget pruning policy
//! - Submitting deletion requests through the cluster CLI
//! - Metrics and structured logging for each run

pub mod cluster;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod policy;
pub mod runner;

pub use cluster::{MachineDeleter, MachineRepository, OcClient, OcClientConfig};
pub use config::{parse_truthy, LabelSelector, PruningConfig};
pub use error::{CommandFailure, PrunerError, PrunerResult};
pub use models::*;
pub use observability::{PrunerMetrics, StructuredLogger};
pub use runner::{Evaluation, Pruner, RunReport};
