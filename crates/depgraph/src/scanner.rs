//! Source file discovery.
//!
//! [`SourceScanner`] walks a project root and yields the files whose
//! extension matches the [`ScanConfig`]. The walk is lazy: directories are
//! read as the iterator advances, and each call to [`SourceScanner::scan`]
//! starts a fresh walk of the filesystem.
//!
//! Entries are visited in sorted order within each directory so two scans of
//! an unchanged tree yield the same sequence.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::ScanConfig;
use crate::error::{Error, Result};

/// Discovers candidate source files under a project root.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    root: PathBuf,
    config: ScanConfig,
}

impl SourceScanner {
    /// Create a scanner for `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// The project root being scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a new walk of the project tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scan`] if the root does not exist, is not a
    /// directory, or cannot be read. Unreadable subdirectories are skipped
    /// with a warning and reported by [`ScanIter::directories_skipped`].
    pub fn scan(&self) -> Result<ScanIter<'_>> {
        let metadata = fs::metadata(&self.root).map_err(|source| Error::Scan {
            root: self.root.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(Error::Scan {
                root: self.root.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    "project root is not a directory",
                ),
            });
        }

        let entries = read_sorted(&self.root).map_err(|source| Error::Scan {
            root: self.root.clone(),
            source,
        })?;

        Ok(ScanIter {
            config: &self.config,
            stack: vec![entries.into_iter()],
            directories_skipped: Vec::new(),
        })
    }

    /// Collect every file from a fresh walk, along with skipped directories.
    ///
    /// # Errors
    ///
    /// See [`Self::scan`].
    pub fn collect(&self) -> Result<(Vec<PathBuf>, Vec<(PathBuf, String)>)> {
        let mut iter = self.scan()?;
        let files: Vec<PathBuf> = iter.by_ref().collect();
        Ok((files, iter.directories_skipped))
    }
}

/// One directory entry, pre-classified so the walk never re-stats.
#[derive(Debug)]
struct Entry {
    path: PathBuf,
    is_dir: bool,
}

/// Lazy depth-first walk produced by [`SourceScanner::scan`].
#[derive(Debug)]
pub struct ScanIter<'a> {
    config: &'a ScanConfig,
    stack: Vec<std::vec::IntoIter<Entry>>,
    directories_skipped: Vec<(PathBuf, String)>,
}

impl ScanIter<'_> {
    /// Directories that could not be read so far (path, error reason).
    #[must_use]
    pub fn directories_skipped(&self) -> &[(PathBuf, String)] {
        &self.directories_skipped
    }
}

impl Iterator for ScanIter<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let top = self.stack.last_mut()?;
            let Some(entry) = top.next() else {
                self.stack.pop();
                continue;
            };

            let Some(name) = entry.path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if entry.is_dir {
                if self.config.is_excluded_dir(name) {
                    continue;
                }
                match read_sorted(&entry.path) {
                    Ok(children) => self.stack.push(children.into_iter()),
                    Err(e) => {
                        warn!(
                            directory = %entry.path.display(),
                            error = %e,
                            "Cannot read directory, skipping"
                        );
                        self.directories_skipped.push((entry.path, e.to_string()));
                    }
                }
            } else if self.config.matches_extension(&entry.path) {
                return Some(entry.path);
            }
        }
    }
}

/// Read a directory's entries sorted by file name.
///
/// Symlinked directories are not followed (they can form cycles); symlinked
/// files are kept.
fn read_sorted(dir: &Path) -> std::io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(
                    directory = %dir.display(),
                    error = %e,
                    "Failed to read directory entry, skipping"
                );
                continue;
            }
        };

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Cannot stat entry, skipping");
                continue;
            }
        };

        let path = entry.path();
        if file_type.is_dir() {
            entries.push(Entry { path, is_dir: true });
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            entries.push(Entry {
                path,
                is_dir: false,
            });
        }
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}
