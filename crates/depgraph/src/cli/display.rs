//! Common display utilities for CLI commands.

use std::path::PathBuf;

use colored::Colorize;
use depgraph::ExtractionWarning;
use serde::Serialize;

const MAX_DISPLAY_ITEMS: usize = 10;

/// Display a list of files with optional truncation.
///
/// Shows up to `MAX_DISPLAY_ITEMS` files with bullet points. If there are more,
/// shows "... and N more". If empty, shows the provided `empty_message`.
pub fn print_paths(paths: &[PathBuf], empty_message: &str) {
    if paths.is_empty() {
        println!("    {}", empty_message.dimmed());
        return;
    }

    for path in paths.iter().take(MAX_DISPLAY_ITEMS) {
        println!("    {} {}", "•".dimmed(), path.display());
    }

    if paths.len() > MAX_DISPLAY_ITEMS {
        println!(
            "    {} ... and {} more",
            "•".dimmed(),
            paths.len() - MAX_DISPLAY_ITEMS
        );
    }
}

/// Print a section heading with a count, e.g. `Dependencies (3):`.
pub fn print_heading(title: &str, count: usize) {
    println!(
        "  {} ({}):",
        title.white().bold(),
        count.to_string().green()
    );
}

/// Summarize extraction warnings on stderr, showing the first few.
pub fn print_warnings(warnings: &[ExtractionWarning]) {
    if warnings.is_empty() {
        return;
    }
    eprintln!(
        "{}: {} file problem(s) during indexing",
        "warning".yellow().bold(),
        warnings.len()
    );
    for warning in warnings.iter().take(5) {
        eprintln!("  {} {warning}", "•".yellow());
    }
    if warnings.len() > 5 {
        eprintln!("  ... and {} more", warnings.len() - 5);
    }
}

/// Serialize `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), depgraph::Error> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| depgraph::Error::Internal(format!("failed to serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}
