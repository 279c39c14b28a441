//! `depgraph index` command implementation.

use std::path::Path;

use colored::Colorize;
use depgraph::DepGraph;

use super::display::print_warnings;

/// Run the index command.
///
/// Prints only the index location on stdout; problems go to stderr.
pub fn run(root: &Path) -> Result<(), depgraph::Error> {
    let depgraph = DepGraph::new(root)?;
    let (_, stats) = depgraph.index()?;

    print_warnings(&stats.warnings);
    if !stats.directories_skipped.is_empty() {
        eprintln!(
            "{}: {} directories could not be read",
            "warning".yellow().bold(),
            stats.directories_skipped.len()
        );
    }

    println!("{}", depgraph.index_path().display());
    Ok(())
}
