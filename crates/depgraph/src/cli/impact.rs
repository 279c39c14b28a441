//! `depgraph impact` command implementation.

use std::path::Path;

use colored::Colorize;
use depgraph::{DepGraph, ImpactResult, LineRange};

use super::display::{print_heading, print_json, print_paths};
use super::OutputFormat;

/// Run the impact command.
pub fn run(
    root: &Path,
    file: &Path,
    lines: &str,
    format: OutputFormat,
) -> Result<(), depgraph::Error> {
    // Reject a bad range before touching the index
    let range: LineRange = lines.parse()?;

    let depgraph = DepGraph::new(root)?;
    let loaded = depgraph.load_or_rebuild()?;

    let relative = depgraph.project_path(file);
    if loaded.modified.contains(&relative) {
        eprintln!(
            "{}: {} changed since it was indexed; line numbers may be out of date (run `depgraph index`)",
            "warning".yellow().bold(),
            relative.display()
        );
    }

    let impact = depgraph.impact(&loaded.index, &relative, range)?;

    match format {
        OutputFormat::Json => print_json(&impact)?,
        OutputFormat::Text => print_impact(&impact, range),
    }
    Ok(())
}

/// Display an impact result as text.
fn print_impact(impact: &ImpactResult, range: LineRange) {
    println!(
        "Impact of {}:{}",
        impact.file.display().to_string().cyan().bold(),
        range
    );
    println!();

    let defined = &impact.symbols_in_range.defined;
    print_heading("Defined", defined.len());
    if defined.is_empty() {
        println!("    {}", "(none)".dimmed());
    }
    for symbol in defined {
        println!(
            "    {} {} {}",
            "•".dimmed(),
            symbol.name.white().bold(),
            format!("({}, {}-{})", symbol.kind, symbol.start_line, symbol.end_line).dimmed()
        );
    }

    let referenced = &impact.symbols_in_range.referenced;
    print_heading("Referenced", referenced.len());
    if referenced.is_empty() {
        println!("    {}", "(none)".dimmed());
    }
    for symbol in referenced {
        println!(
            "    {} {} {}",
            "•".dimmed(),
            symbol.name,
            format!("(line {})", symbol.line).dimmed()
        );
    }

    println!();
    print_heading("Dependencies", impact.dependencies.len());
    print_paths(&impact.dependencies, "(none)");

    print_heading("Impacted files", impact.impacted_files.len());
    print_paths(&impact.impacted_files, "(none)");

    if !impact.usages.is_empty() {
        println!();
        println!("  {}:", "Usages".white().bold());
        for (name, sites) in &impact.usages {
            println!("    {} ({}):", name.cyan(), sites.len());
            for site in sites {
                println!("      {} {}:{}", "•".dimmed(), site.file.display(), site.line);
            }
        }
    }

    if !impact.conformances.is_empty() {
        println!();
        println!("  {}:", "Conformances".white().bold());
        for edge in &impact.conformances {
            println!("    {} {}: {}", "•".dimmed(), edge.subtype, edge.supertype);
        }
    }
}
