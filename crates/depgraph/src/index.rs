//! The project-wide index.
//!
//! An [`Index`] is immutable once built. Re-indexing produces a new value
//! that replaces the old one; nothing patches an index in place, so any
//! number of threads may query the same index without locking.
//!
//! Declarations and references are stored once, sorted by file and line, and
//! reached through name and file lookups:
//!
//! ```text
//! declarations: [A.swift: helper 10-15, A.swift: Model 20-40, B.swift: run 1-50]
//!                 ^ by_name["helper"]                          ^ by_file["B.swift"]
//! ```
//!
//! References whose name matches no declaration are kept. They still show up
//! in `referenced` results but contribute no file dependency.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::types::{ConformanceEdge, SourceFile, SymbolDeclaration, SymbolKind, SymbolReference};

/// Immutable aggregate of every file's declarations, references, and
/// conformance edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    files: BTreeMap<PathBuf, SourceFile>,
    /// Source files the build found but could not extract
    skipped: BTreeSet<PathBuf>,
    declarations: Vec<SymbolDeclaration>,
    references: Vec<SymbolReference>,
    conformances: BTreeSet<ConformanceEdge>,
    declarations_by_name: HashMap<String, Vec<usize>>,
    declarations_by_file: HashMap<PathBuf, Range<usize>>,
    references_by_name: HashMap<String, Vec<usize>>,
    references_by_file: HashMap<PathBuf, Range<usize>>,
}

impl Index {
    /// Assemble an index from its parts.
    ///
    /// Input order does not matter: declarations and references are sorted
    /// by (file, line), and references are deduplicated by (file, line, name).
    /// Declarations and references whose file is not in `files` are dropped.
    #[must_use]
    pub fn from_parts(
        files: impl IntoIterator<Item = SourceFile>,
        declarations: impl IntoIterator<Item = SymbolDeclaration>,
        references: impl IntoIterator<Item = SymbolReference>,
        conformances: impl IntoIterator<Item = ConformanceEdge>,
    ) -> Self {
        let files: BTreeMap<PathBuf, SourceFile> = files
            .into_iter()
            .map(|f| (f.path.clone(), f))
            .collect();

        let mut declarations: Vec<SymbolDeclaration> = declarations
            .into_iter()
            .filter(|d| files.contains_key(&d.file))
            .collect();
        declarations.sort_by(|a, b| {
            (&a.file, a.start_line, a.kind, &a.name, a.end_line)
                .cmp(&(&b.file, b.start_line, b.kind, &b.name, b.end_line))
        });

        let mut references: Vec<SymbolReference> = references
            .into_iter()
            .filter(|r| files.contains_key(&r.file))
            .collect();
        references.sort_by(|a, b| (&a.file, a.line, &a.name).cmp(&(&b.file, b.line, &b.name)));
        references.dedup();

        let conformances = conformances
            .into_iter()
            .filter(|c| files.contains_key(&c.file))
            .collect();

        let mut declarations_by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, decl) in declarations.iter().enumerate() {
            declarations_by_name
                .entry(decl.name.clone())
                .or_default()
                .push(i);
        }

        let mut references_by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, reference) in references.iter().enumerate() {
            references_by_name
                .entry(reference.name.clone())
                .or_default()
                .push(i);
        }

        let declarations_by_file = file_ranges(&declarations, |d| &d.file);
        let references_by_file = file_ranges(&references, |r| &r.file);

        Self {
            files,
            skipped: BTreeSet::new(),
            declarations,
            references,
            conformances,
            declarations_by_name,
            declarations_by_file,
            references_by_name,
            references_by_file,
        }
    }

    /// Record source files that were found but excluded from extraction
    /// (unreadable, not UTF-8, or too large).
    ///
    /// They are not queryable, but they are part of the project's file set,
    /// so their presence alone never makes a stored index stale. Paths that
    /// are also indexed are ignored.
    #[must_use]
    pub fn with_skipped(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let skipped = paths
            .into_iter()
            .filter(|p| !self.files.contains_key(p))
            .collect();
        self.skipped = skipped;
        self
    }

    // === Files ===

    /// Indexed files in path order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    /// Look up an indexed file by its project-relative path.
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.files.get(path)
    }

    /// Whether `path` is part of the index.
    #[must_use]
    pub fn contains_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Number of indexed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Files found by the scan but skipped during extraction, in path order.
    pub fn skipped_files(&self) -> impl Iterator<Item = &Path> {
        self.skipped.iter().map(PathBuf::as_path)
    }

    // === Declarations ===

    /// All declarations, sorted by file then start line.
    #[must_use]
    pub fn declarations(&self) -> &[SymbolDeclaration] {
        &self.declarations
    }

    /// Declarations in one file, in source order.
    #[must_use]
    pub fn declarations_in(&self, path: &Path) -> &[SymbolDeclaration] {
        self.declarations_by_file
            .get(path)
            .map_or(&[][..], |range| &self.declarations[range.clone()])
    }

    /// Every declaration with this name, across all files.
    pub fn declarations_named<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a SymbolDeclaration> + use<'a> {
        self.declarations_by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|&i| &self.declarations[i])
    }

    /// Whether any file declares `name`.
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.declarations_by_name.contains_key(name)
    }

    /// Number of declarations across all files.
    #[must_use]
    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    /// Number of declarations per kind. Kinds with no declarations are
    /// present with a count of zero.
    #[must_use]
    pub fn counts_by_kind(&self) -> BTreeMap<SymbolKind, usize> {
        let mut counts: BTreeMap<SymbolKind, usize> =
            SymbolKind::ALL.into_iter().map(|k| (k, 0)).collect();
        for decl in &self.declarations {
            *counts.entry(decl.kind).or_default() += 1;
        }
        counts
    }

    // === References ===

    /// All references, sorted by file then line.
    #[must_use]
    pub fn references(&self) -> &[SymbolReference] {
        &self.references
    }

    /// References made from one file, in source order.
    #[must_use]
    pub fn references_in(&self, path: &Path) -> &[SymbolReference] {
        self.references_by_file
            .get(path)
            .map_or(&[][..], |range| &self.references[range.clone()])
    }

    /// Every reference to `name`, sorted by file then line.
    pub fn references_to<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a SymbolReference> + use<'a> {
        self.references_by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|&i| &self.references[i])
    }

    /// Number of distinct (file, line, name) references.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    // === Conformances ===

    /// Direct conformance edges in (subtype, supertype, file) order.
    pub fn conformances(&self) -> impl Iterator<Item = &ConformanceEdge> {
        self.conformances.iter()
    }

    /// Number of distinct conformance edges.
    #[must_use]
    pub fn conformance_count(&self) -> usize {
        self.conformances.len()
    }
}

/// Map each file to the contiguous range of `items` it owns.
///
/// `items` must already be sorted by file.
fn file_ranges<T>(items: &[T], file: impl Fn(&T) -> &PathBuf) -> HashMap<PathBuf, Range<usize>> {
    let mut ranges = HashMap::new();
    let mut start = 0;
    for i in 1..=items.len() {
        if i == items.len() || file(&items[i]) != file(&items[start]) {
            ranges.insert(file(&items[start]).clone(), start..i);
            start = i;
        }
    }
    ranges
}
