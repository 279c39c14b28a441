//! `depgraph conformers` command implementation.

use std::path::Path;

use colored::Colorize;
use depgraph::{ConformanceGraph, ConformanceHop, DepGraph};
use serde::Serialize;

use super::display::print_json;
use super::OutputFormat;

#[derive(Serialize)]
struct Conformers<'a> {
    #[serde(rename = "type")]
    type_name: &'a str,
    supertypes: Vec<ConformanceHop>,
    subtypes: Vec<ConformanceHop>,
}

/// Run the conformers command.
pub fn run(root: &Path, type_name: &str, format: OutputFormat) -> Result<(), depgraph::Error> {
    let depgraph = DepGraph::new(root)?;
    let loaded = depgraph.load_or_rebuild()?;
    let graph = ConformanceGraph::from_index(&loaded.index);

    let result = Conformers {
        type_name,
        supertypes: graph.supertypes(type_name),
        subtypes: graph.subtypes(type_name),
    };

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => {
            if !graph.contains(type_name) {
                println!("{} has no recorded conformances", type_name.cyan().bold());
                return Ok(());
            }
            println!("Conformances of {}:", type_name.cyan().bold());
            println!();
            print_hops("Conforms to", &result.supertypes);
            println!();
            print_hops("Conformed to by", &result.subtypes);
        }
    }
    Ok(())
}

fn print_hops(title: &str, hops: &[ConformanceHop]) {
    println!("  {} ({}):", title.white().bold(), hops.len());
    if hops.is_empty() {
        println!("    {}", "(none)".dimmed());
    }
    for hop in hops {
        let indent = "  ".repeat(hop.depth.saturating_sub(1));
        println!("    {indent}{} {}", "•".dimmed(), hop.name);
    }
}
