//! Deletion plan preview command

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use pruner_lib::Pruner;

use crate::output::{print_info, print_json, print_success, print_warning, OutputFormat};

/// Evaluate the pruning policy against the live snapshot without deleting anything
pub async fn show_plan(pruner: &Pruner, format: OutputFormat) -> Result<()> {
    let evaluation = pruner.evaluate(Utc::now()).await?;
    let config = pruner.config();

    match format {
        OutputFormat::Json => print_json(&evaluation)?,
        OutputFormat::Table => {
            println!("{}", "Deletion Plan".bold());
            println!("{}", "=".repeat(50));
            println!("Max age:              {}h", config.max_age_hours());
            println!(
                "Deletion budget:      {} ({} in Deleting phase)",
                config.max_concurrent_deleting(),
                evaluation.deleting
            );
            println!("Selector:             {}", config.label_selector());
            println!("Machines listed:      {}", evaluation.machines.len());
            println!();

            if evaluation.budget_exhausted {
                print_warning("Deleting machines limit exhausted, nothing would be deleted");
                return Ok(());
            }

            if evaluation.plan.is_empty() {
                print_success("No machines exceed the maximum age");
                return Ok(());
            }

            for (i, name) in evaluation.plan.iter().enumerate() {
                println!("  {}. {}", i + 1, name.cyan());
            }
            println!();
            if evaluation.plan.eligible() > evaluation.plan.len() {
                print_info(&format!(
                    "{} machines exceed the maximum age, limited to {} by the deletion budget",
                    evaluation.plan.eligible(),
                    evaluation.plan.len()
                ));
            }
            print_info("Preview only: run the pruner job to submit these deletions");
        }
    }

    Ok(())
}
