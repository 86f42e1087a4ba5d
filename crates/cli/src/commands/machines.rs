//! Machine listing command

use anyhow::Result;
use chrono::{DateTime, Utc};
use pruner_lib::{MachinePhase, Pruner};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{color_phase, format_age, format_flag, print_json, print_warning, OutputFormat};

/// Row for machines table
#[derive(Tabled)]
struct MachineRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Eligible")]
    eligible: String,
    #[tabled(rename = "Planned")]
    planned: String,
}

#[derive(Serialize)]
struct MachineEntry<'a> {
    name: &'a str,
    phase: &'a MachinePhase,
    created_at: DateTime<Utc>,
    age_hours: f64,
    eligible: bool,
    planned: bool,
}

/// List worker machines with their age and pruning status
pub async fn show_machines(
    pruner: &Pruner,
    eligible_only: bool,
    format: OutputFormat,
) -> Result<()> {
    let evaluation = pruner.evaluate(Utc::now()).await?;
    let max_age = pruner.config().max_age_hours();

    let entries: Vec<MachineEntry> = evaluation
        .machines
        .iter()
        .map(|m| {
            let age_hours = m.age_hours(evaluation.evaluated_at);
            MachineEntry {
                name: &m.name,
                phase: &m.phase,
                created_at: m.created_at,
                age_hours,
                eligible: m.is_running() && age_hours > max_age,
                planned: evaluation.plan.iter().any(|p| p == m.name),
            }
        })
        .filter(|e| !eligible_only || e.eligible)
        .collect();

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Table => {
            if entries.is_empty() {
                print_warning("No machines found");
                return Ok(());
            }

            let rows: Vec<MachineRow> = entries
                .iter()
                .map(|e| MachineRow {
                    name: e.name.to_string(),
                    phase: color_phase(e.phase),
                    created: e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    age: format_age(e.age_hours),
                    eligible: format_flag(e.eligible),
                    planned: format_flag(e.planned),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} machines", entries.len());
        }
    }

    Ok(())
}
