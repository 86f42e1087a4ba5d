//! Aged Machines Pruner CLI
//!
//! A read-only command-line tool for inspecting worker machine ages and
//! previewing what the pruner would delete on its next run.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{machines, plan};
use pruner_lib::cluster::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_MACHINE_NAMESPACE};
use pruner_lib::{LabelSelector, OcClient, OcClientConfig, Pruner, PruningConfig, StructuredLogger};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Aged Machines Pruner CLI
#[derive(Parser)]
#[command(name = "amp")]
#[command(author, version, about = "CLI for the Aged Machines Pruner", long_about = None)]
pub struct Cli {
    /// Maximum machine age in hours
    #[arg(long, env = "MACHINE_MAX_AGE_HOURS", default_value_t = 168.0)]
    pub max_age_hours: f64,

    /// Maximum number of machines in Deleting phase at once
    #[arg(long, env = "MAX_DELETING_AT_ONCE", default_value_t = 1)]
    pub max_deleting_at_once: usize,

    /// Comma-separated label selectors added to the worker defaults
    #[arg(long, env = "ADDITIONAL_LABELS", default_value = "")]
    pub additional_labels: String,

    /// Namespace holding the Machine objects
    #[arg(long, short, env = "MACHINE_NAMESPACE", default_value = DEFAULT_MACHINE_NAMESPACE)]
    pub namespace: String,

    /// Cluster CLI binary
    #[arg(long, env = "OC_BINARY", default_value = "oc")]
    pub oc_binary: PathBuf,

    /// Timeout for each cluster command, in seconds
    #[arg(long, env = "COMMAND_TIMEOUT_SECS", default_value_t = DEFAULT_COMMAND_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List worker machines with age and pruning status
    Machines {
        /// Show only machines past the maximum age
        #[arg(long)]
        eligible_only: bool,
    },

    /// Preview the deletion plan for the current cluster state
    Plan,
}

impl Cli {
    fn pruner(&self) -> Result<Pruner> {
        // Previews never delete, the flag only matters for how the config reads
        let config = PruningConfig::new(
            self.max_age_hours,
            self.max_deleting_at_once,
            true,
            LabelSelector::with_additional(&self.additional_labels),
        )?;

        let client = Arc::new(OcClient::new(OcClientConfig {
            binary: self.oc_binary.clone(),
            namespace: self.namespace.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }));

        Ok(Pruner::new(
            client.clone(),
            client,
            config,
            StructuredLogger::new(&self.namespace),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let pruner = cli.pruner()?;

    match cli.command {
        Commands::Machines { eligible_only } => {
            machines::show_machines(&pruner, eligible_only, cli.format).await?;
        }
        Commands::Plan => {
            plan::show_plan(&pruner, cli.format).await?;
        }
    }

    Ok(())
}
