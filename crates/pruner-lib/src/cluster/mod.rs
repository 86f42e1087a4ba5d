//! Cluster access for listing and deleting machines
//!
//! The pruner only talks to the cluster through the two traits below so that
//! the runner can be exercised against in-memory fakes. The production
//! implementation shells out to the cluster CLI (`oc`).

mod decode;
mod oc;

pub use decode::decode_machine_list;
pub use oc::{OcClient, OcClientConfig, DEFAULT_COMMAND_TIMEOUT, DEFAULT_MACHINE_NAMESPACE};

use crate::config::LabelSelector;
use crate::error::PrunerResult;
use crate::models::MachineRecord;

pub use async_trait::async_trait;

/// Source of machine snapshots
#[async_trait]
pub trait MachineRepository: Send + Sync {
    /// List machines matching the selector, in the order the cluster reports them
    async fn list_machines(&self, selector: &LabelSelector) -> PrunerResult<Vec<MachineRecord>>;
}

/// Submits machine deletion requests
#[async_trait]
pub trait MachineDeleter: Send + Sync {
    /// Request deletion without waiting for the machine to go away.
    /// With `simulate` set the request is validated but changes nothing.
    async fn delete_machine(&self, name: &str, simulate: bool) -> PrunerResult<()>;
}
