//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use pruner_lib::MachinePhase;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format an age in hours, switching to days past 48h
pub fn format_age(hours: f64) -> String {
    if hours < 0.0 {
        format!("{:.1}h (future)", hours)
    } else if hours >= 48.0 {
        format!("{:.1}d", hours / 24.0)
    } else {
        format!("{:.1}h", hours)
    }
}

/// Color a machine phase
pub fn color_phase(phase: &MachinePhase) -> String {
    match phase {
        MachinePhase::Running => phase.as_str().green().to_string(),
        MachinePhase::Deleting => phase.as_str().red().to_string(),
        MachinePhase::Other(raw) => raw.yellow().to_string(),
    }
}

/// Render a yes/no flag, highlighting yes
pub fn format_flag(value: bool) -> String {
    if value {
        "yes".red().bold().to_string()
    } else {
        "no".dimmed().to_string()
    }
}
