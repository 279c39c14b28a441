//! CLI command implementations.

mod display;

pub mod conformers;
pub mod impact;
pub mod index;
pub mod stats;

/// How query results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Human-readable, colored text
    Text,
}
