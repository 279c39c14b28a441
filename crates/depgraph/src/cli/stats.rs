//! `depgraph stats` command implementation.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use colored::Colorize;
use depgraph::DepGraph;

/// Run the stats command.
pub fn run(root: &Path) -> Result<(), depgraph::Error> {
    let depgraph = DepGraph::new(root)?;
    let store = depgraph.store();
    let index = store.load()?;
    let meta = store.metadata()?;

    println!("{}", "Index Statistics".white().bold());
    println!();
    println!("  {}: {}", "Location".dimmed(), store.path().display());
    println!("  {}: {}", "Indexed".dimmed(), age(meta.indexed_at));
    println!();
    println!("  {}: {}", "Files".cyan(), index.file_count());
    println!("  {}: {}", "Declarations".cyan(), index.declaration_count());
    println!("  {}: {}", "References".cyan(), index.reference_count());
    println!("  {}: {}", "Conformances".cyan(), index.conformance_count());
    println!();

    println!("  {}:", "Declarations by kind".white().bold());
    for (kind, count) in index.counts_by_kind() {
        if count > 0 {
            println!("    {kind:<12} {count}");
        }
    }

    Ok(())
}

/// Describe how long ago `indexed_at` (Unix seconds) was.
fn age(indexed_at: u64) -> String {
    let then = UNIX_EPOCH + Duration::from_secs(indexed_at);
    match SystemTime::now().duration_since(then) {
        Ok(elapsed) if elapsed.as_secs() < 60 => "just now".to_string(),
        Ok(elapsed) if elapsed.as_secs() < 3600 => format!("{} min ago", elapsed.as_secs() / 60),
        Ok(elapsed) if elapsed.as_secs() < 86_400 => format!("{} h ago", elapsed.as_secs() / 3600),
        Ok(elapsed) => format!("{} days ago", elapsed.as_secs() / 86_400),
        Err(_) => "in the future (clock skew?)".to_string(),
    }
}
