//! CLI command implementations

pub mod machines;
pub mod plan;
