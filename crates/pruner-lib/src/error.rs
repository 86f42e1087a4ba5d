//! Error types for the machine pruner

use std::fmt;
use thiserror::Error;

/// Result type alias for pruner operations.
pub type PrunerResult<T> = Result<T, PrunerError>;

/// Captured outcome of a cluster command that did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    /// Full command line as it was executed
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process never ran to completion
    pub code: Option<i32>,
}

impl CommandFailure {
    /// Failure where the process could not be started or was cut off
    pub fn aborted(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            stdout: String::new(),
            stderr: reason.into(),
            code: None,
        }
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string());
        write!(
            f,
            "`{}` exited with code {}: {}",
            self.command,
            code,
            self.stderr.trim()
        )
    }
}

/// Errors that abort a pruning run
#[derive(Debug, Error)]
pub enum PrunerError {
    /// Machine state could not be listed
    #[error("machine query failed: {0}")]
    Query(CommandFailure),

    /// A listed machine could not be decoded, or the snapshot is inconsistent
    #[error("invalid machine record: {0}")]
    InvalidRecord(String),

    /// A deletion request could not be submitted
    #[error("failed to request deletion of machine {name}: {failure}")]
    Deletion {
        name: String,
        failure: CommandFailure,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PrunerError {
    /// Process exit code for this error kind
    pub fn exit_code(&self) -> u8 {
        match self {
            PrunerError::Query(_) => 2,
            PrunerError::InvalidRecord(_) => 3,
            PrunerError::Deletion { .. } => 4,
            PrunerError::Config(_) => 5,
        }
    }

    /// Underlying command failure, if this error came from a cluster command
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self {
            PrunerError::Query(failure) => Some(failure),
            PrunerError::Deletion { failure, .. } => Some(failure),
            _ => None,
        }
    }
}
