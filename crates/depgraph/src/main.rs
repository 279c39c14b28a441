//! depgraph CLI - line-range impact analysis from the command line.
//!
//! depgraph indexes Swift sources and answers which files and symbols a
//! change to a given line range affects.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::OutputFormat;

/// depgraph: who depends on these lines?
#[derive(Parser)]
#[command(name = "depgraph")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and save it; prints the index location
    Index,

    /// Show what a line range defines, uses, and is used by
    Impact {
        /// Source file, relative to the project root or absolute
        file: PathBuf,

        /// Inclusive 1-based line range, e.g. 10:15
        #[arg(short, long)]
        lines: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Show counts from the stored index
    Stats,

    /// Show the conformance chain of a type in both directions
    Conformers {
        /// Type name (e.g., "`ViewModel`" or "`Codable`")
        type_name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Determine project root
    let root = match cli.path {
        Some(p) => p,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!(
                    "{}: failed to get current directory: {e}",
                    "error".red().bold()
                );
                return ExitCode::FAILURE;
            }
        },
    };

    let result = match cli.command {
        Commands::Index => cli::index::run(&root),
        Commands::Impact {
            file,
            lines,
            format,
        } => cli::impact::run(&root, &file, &lines, format),
        Commands::Stats => cli::stats::run(&root),
        Commands::Conformers { type_name, format } => {
            cli::conformers::run(&root, &type_name, format)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
