//! Index construction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        build_index                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Phase 1 (Sequential): SourceScanner walk, sorted paths      │
//! │  Phase 2 (Parallel):   rayon par_iter read + extract         │
//! │  Phase 3 (Sequential): merge into one immutable Index        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Workers share nothing: each produces a [`FileOutcome`] and the merge
//! happens only after every file is done. Cancellation is checked before
//! each file; a cancelled build returns [`Error::Cancelled`] and nothing
//! from it is ever returned as an index.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::error::{Error, ExtractionWarning, Result};
use crate::extract::{extract, FileExtraction};
use crate::index::Index;
use crate::scanner::SourceScanner;
use crate::types::{IndexStats, SourceFile};

/// Shared flag for interrupting a build between files.
///
/// Clones share the same flag, so a token can be handed to a signal handler
/// or another thread while the build holds its own copy.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Files already being extracted finish; no new
    /// file is started.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of processing one file on a worker thread.
#[derive(Debug)]
enum FileOutcome {
    Extracted {
        file: SourceFile,
        extraction: FileExtraction,
    },
    Skipped(ExtractionWarning),
    Cancelled,
}

/// Build a fresh index of every source file under `root`.
///
/// Paths in the resulting index are relative to `root`.
///
/// # Errors
///
/// - [`Error::Scan`] if `root` cannot be walked
/// - [`Error::Cancelled`] if `cancel` was triggered before the last file
/// - [`Error::Config`] if a worker pool of `config.threads` cannot be built
pub fn build_index(
    root: &Path,
    config: &ScanConfig,
    cancel: &CancellationToken,
) -> Result<(Index, IndexStats)> {
    let start = Instant::now();

    let scanner = SourceScanner::new(root, config.clone());
    let (paths, directories_skipped) = scanner.collect()?;
    info!(
        root = %root.display(),
        files = paths.len(),
        "Indexing source files"
    );

    let max_bytes = config.max_file_bytes;
    let work = || -> Vec<FileOutcome> {
        paths
            .par_iter()
            .map(|path| {
                if cancel.is_cancelled() {
                    return FileOutcome::Cancelled;
                }
                process_file(root, path, max_bytes)
            })
            .collect()
    };

    let outcomes = match config.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::Config(format!("cannot start {threads} worker threads: {e}")))?
            .install(work),
        None => work(),
    };

    if cancel.is_cancelled() {
        info!("Indexing cancelled, discarding partial results");
        return Err(Error::Cancelled);
    }

    let mut stats = IndexStats {
        directories_skipped,
        ..IndexStats::default()
    };
    let mut files = Vec::with_capacity(outcomes.len());
    let mut declarations = Vec::new();
    let mut references = Vec::new();
    let mut conformances = Vec::new();
    let mut skipped = Vec::new();

    for outcome in outcomes {
        match outcome {
            FileOutcome::Extracted { file, extraction } => {
                for warning in &extraction.warnings {
                    warn!(warning = %warning, "Partial extraction");
                }
                stats.files_indexed += 1;
                stats.warnings.extend(extraction.warnings);
                files.push(file);
                declarations.extend(extraction.declarations);
                references.extend(extraction.references);
                conformances.extend(extraction.conformances);
            }
            FileOutcome::Skipped(warning) => {
                warn!(warning = %warning, "Skipping file");
                stats.files_skipped += 1;
                skipped.push(warning.path.clone());
                stats.warnings.push(warning);
            }
            FileOutcome::Cancelled => return Err(Error::Cancelled),
        }
    }

    let index =
        Index::from_parts(files, declarations, references, conformances).with_skipped(skipped);
    stats.declarations_found = index.declaration_count();
    stats.references_found = index.reference_count();
    stats.conformances_found = index.conformance_count();
    stats.duration = start.elapsed();

    info!(
        files = stats.files_indexed,
        skipped = stats.files_skipped,
        declarations = stats.declarations_found,
        references = stats.references_found,
        duration_ms = stats.duration.as_millis(),
        "Index built"
    );

    Ok((index, stats))
}

/// Read, fingerprint, and extract one file.
fn process_file(root: &Path, path: &Path, max_bytes: u64) -> FileOutcome {
    let relative = relative_path(root, path);

    match fs::metadata(path) {
        Ok(metadata) if metadata.len() > max_bytes => {
            return FileOutcome::Skipped(ExtractionWarning::too_large(
                relative,
                metadata.len(),
                max_bytes,
            ));
        }
        Ok(_) => {}
        Err(e) => return FileOutcome::Skipped(ExtractionWarning::unreadable(relative, &e)),
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return FileOutcome::Skipped(ExtractionWarning::unreadable(relative, &e)),
    };
    let content_hash = content_hash(&bytes);

    let Ok(text) = String::from_utf8(bytes) else {
        return FileOutcome::Skipped(ExtractionWarning::encoding(relative));
    };

    let extraction = extract(&relative, &text);
    debug!(
        path = %relative.display(),
        declarations = extraction.declarations.len(),
        references = extraction.references.len(),
        "Extracted file"
    );

    FileOutcome::Extracted {
        file: SourceFile {
            path: relative,
            content_hash,
            line_count: line_count(&text),
        },
        extraction,
    }
}

/// Fingerprint of file content, stable across runs and platforms.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(bytes)
}

/// Path of `path` relative to `root`, or `path` unchanged if it is outside.
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn line_count(text: &str) -> u32 {
    u32::try_from(text.lines().count()).unwrap_or(u32::MAX)
}
