//! # depgraph: Line-Range Impact Analysis for Swift Projects
//!
//! depgraph indexes a project's Swift sources into a graph of declarations,
//! references, and conformances, then answers "what breaks if I change these
//! lines?" for any file and line range.
//!
//! ## Design Philosophy
//!
//! - **Lexical, not semantic** - a brace-tracking scan finds declarations and
//!   identifiers; names are joined across files without type checking
//! - **Best effort indexing** - one malformed file yields a warning and a
//!   partial result, never a failed build
//! - **Strict queries** - an unknown file or bad range fails that query with
//!   a precise message
//! - **Immutable snapshots** - an [`Index`] is never patched; re-indexing
//!   builds a new one and replaces the stored copy atomically
//!
//! ## Quick Start
//!
//! ```no_run
//! use depgraph::{DepGraph, LineRange};
//! use std::path::Path;
//!
//! let depgraph = DepGraph::new(Path::new("/path/to/project"))?;
//!
//! // Build and persist the index
//! let (_, stats) = depgraph.index()?;
//! println!("Indexed {} files", stats.files_indexed);
//!
//! // What depends on lines 10-15 of Helpers.swift?
//! let loaded = depgraph.load_or_rebuild()?;
//! let range: LineRange = "10:15".parse()?;
//! let impact = depgraph.impact(&loaded.index, Path::new("Sources/Helpers.swift"), range)?;
//! println!("{} files impacted", impact.impacted_files.len());
//! # Ok::<(), depgraph::Error>(())
//! ```

pub mod config;
mod error;
pub mod extract;
mod graph;
mod impact;
mod index;
mod indexer;
mod scanner;
mod store;
mod types;

pub use config::ScanConfig;
pub use error::{Error, ExtractionWarning, ExtractionWarningKind, Result};
pub use graph::{ConformanceGraph, ConformanceHop};
pub use impact::analyze_impact;
pub use index::Index;
pub use indexer::{build_index, content_hash, CancellationToken};
pub use scanner::{ScanIter, SourceScanner};
pub use store::{IndexStore, StoreMetadata};
pub use types::{
    ConformanceEdge, DefinedSymbol, ImpactResult, IndexStats, LineRange, ReferencedSymbol,
    SourceFile, StaleReport, SymbolDeclaration, SymbolKind, SymbolReference, SymbolsInRange,
    Usage,
};

use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};

/// An index obtained by [`DepGraph::load_or_rebuild`].
#[derive(Debug)]
pub struct LoadedIndex {
    /// The usable index
    pub index: Index,
    /// Whether the stored index was missing, stale, or corrupt and had to be
    /// rebuilt
    pub rebuilt: bool,
    /// Files whose content changed since the stored index was built. Line
    /// numbers in these files may no longer match the index.
    pub modified: Vec<PathBuf>,
}

/// A project root with its configuration and index location.
///
/// `DepGraph` holds no index itself: each call to [`Self::index`] or
/// [`Self::load_or_rebuild`] returns a fresh [`Index`] value that the caller
/// owns and may share freely between threads.
#[derive(Debug, Clone)]
pub struct DepGraph {
    root: PathBuf,
    config: ScanConfig,
    store: IndexStore,
}

impl DepGraph {
    /// Open a project, loading `.depgraph/config.yaml` if present.
    ///
    /// # Errors
    ///
    /// - [`Error::Scan`] if `root` does not exist
    /// - [`Error::Config`] if the configuration file is invalid
    pub fn new(root: &Path) -> Result<Self> {
        let root = canonical_root(root)?;
        let config = ScanConfig::load(&root)?;
        Ok(Self::from_parts(root, config))
    }

    /// Open a project with an explicit configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Scan`] if `root` does not exist
    /// - [`Error::Config`] if `config` fails validation
    pub fn with_config(root: &Path, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(canonical_root(root)?, config))
    }

    fn from_parts(root: PathBuf, config: ScanConfig) -> Self {
        let store = IndexStore::new(config.index_location(&root));
        Self {
            root,
            config,
            store,
        }
    }

    /// Project root being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan settings in effect.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Persistent store backing this project.
    #[must_use]
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Location of the stored index.
    #[must_use]
    pub fn index_path(&self) -> &Path {
        self.store.path()
    }

    // === Indexing ===

    /// Build a fresh index and persist it.
    ///
    /// # Errors
    ///
    /// See [`build_index`] and [`IndexStore::save`].
    pub fn index(&self) -> Result<(Index, IndexStats)> {
        self.index_with_cancel(&CancellationToken::new())
    }

    /// Build a fresh index and persist it, stopping early if `cancel` fires.
    ///
    /// A cancelled build is never saved; the previously stored index stays
    /// in place.
    ///
    /// # Errors
    ///
    /// See [`build_index`] and [`IndexStore::save`].
    pub fn index_with_cancel(&self, cancel: &CancellationToken) -> Result<(Index, IndexStats)> {
        let (index, stats) = build_index(&self.root, &self.config, cancel)?;
        self.store.save(&index, &self.root)?;
        Ok((index, stats))
    }

    /// Load the stored index, rebuilding it if it is missing, stale, or
    /// corrupt.
    ///
    /// # Errors
    ///
    /// Returns an error only if a required rebuild fails, or the stored
    /// index cannot be read for a reason other than corruption.
    pub fn load_or_rebuild(&self) -> Result<LoadedIndex> {
        if !self.store.exists() {
            info!(path = %self.store.path().display(), "No index found, building");
            return self.rebuild();
        }

        let index = match self.store.load() {
            Ok(index) => index,
            Err(e @ Error::CorruptIndex { .. }) => {
                warn!(error = %e, "Stored index is unusable, rebuilding");
                return self.rebuild();
            }
            Err(e) => return Err(e),
        };

        let report = self.store.stale_report(&self.root, &self.config)?;
        if report.is_stale() {
            info!(
                added = report.added.len(),
                deleted = report.deleted.len(),
                "Index is stale, rebuilding"
            );
            return self.rebuild();
        }

        Ok(LoadedIndex {
            index,
            rebuilt: false,
            modified: report.modified,
        })
    }

    fn rebuild(&self) -> Result<LoadedIndex> {
        let (index, _) = self.index()?;
        Ok(LoadedIndex {
            index,
            rebuilt: true,
            modified: Vec::new(),
        })
    }

    // === Queries ===

    /// Impact of changing `range` in `file`.
    ///
    /// `file` may be project-relative (`Sources/A.swift`, `./Sources/A.swift`)
    /// or an absolute path under the project root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFile`] if the file is not in `index`.
    pub fn impact(&self, index: &Index, file: &Path, range: LineRange) -> Result<ImpactResult> {
        analyze_impact(index, &self.project_path(file), range)
    }

    /// Convert a user-supplied path to the project-relative form used in the
    /// index.
    #[must_use]
    pub fn project_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            let canonical = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
            return canonical
                .strip_prefix(&self.root)
                .map_or(canonical.clone(), Path::to_path_buf);
        }
        file.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    root.canonicalize().map_err(|source| Error::Scan {
        root: root.to_path_buf(),
        source,
    })
}
