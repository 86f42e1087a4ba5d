//! Aged Machines Pruner - deletes worker machines past their maximum age
//!
//! Intended to run as a Kubernetes CronJob. Each invocation performs a single
//! pass and exits; a non-zero exit code identifies the kind of failure.

use anyhow::Result;
use pruner_lib::{OcClient, PrunerError, PrunerMetrics, Pruner, StructuredLogger};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const PRUNER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit code for failures that are not pruner errors (e.g. unreadable environment)
const EXIT_SETUP_FAILURE: u8 = 1;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code(&err);
            error!(error = %format!("{:#}", err), exit_code = code, "Pruner failed");
            ExitCode::from(code)
        }
    }
}

async fn run() -> Result<()> {
    let settings = config::PrunerSettings::load()?;
    let pruning_config = settings.pruning_config()?;
    let oc_config = settings.oc_client_config();

    let logger = StructuredLogger::new(&oc_config.namespace);
    logger.log_run_started(PRUNER_VERSION, &pruning_config);

    let client = Arc::new(OcClient::new(oc_config));
    let pruner = Pruner::new(client.clone(), client, pruning_config, logger);

    let result = pruner.run(chrono::Utc::now()).await;

    if let Some(path) = &settings.metrics_textfile {
        if let Err(e) = PrunerMetrics::new().write_textfile(path) {
            warn!(error = %e, path = %path.display(), "Failed to write metrics textfile");
        }
    }

    let report = result?;
    info!(
        requested = report.requested.len(),
        dry_run = report.dry_run,
        "Done"
    );
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PrunerError>()
        .map(PrunerError::exit_code)
        .unwrap_or(EXIT_SETUP_FAILURE)
}
