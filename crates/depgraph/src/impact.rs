//! Line-range impact analysis.
//!
//! Given a file and an inclusive line range, [`analyze_impact`] answers two
//! questions against an [`Index`]:
//!
//! - **What does this range use?** References on those lines, and the files
//!   declaring them (`dependencies`)
//! - **What uses this range?** Declarations overlapping those lines, every
//!   reference to them (`usages`), and the other files making those
//!   references (`impactedFiles`)
//!
//! Impact is one hop. A file that depends on an impacted file is not itself
//! reported.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::index::Index;
use crate::types::{
    DefinedSymbol, ImpactResult, LineRange, ReferencedSymbol, SymbolDeclaration, SymbolsInRange,
    Usage,
};

/// Compute the impact of changing `range` in `file`.
///
/// `file` is the project-relative path as stored in the index. The result is
/// a pure function of the index and the inputs.
///
/// # Errors
///
/// Returns [`Error::UnknownFile`] if `file` is not in the index.
pub fn analyze_impact(index: &Index, file: &Path, range: LineRange) -> Result<ImpactResult> {
    if !index.contains_file(file) {
        return Err(Error::UnknownFile(file.to_path_buf()));
    }

    let mut defined: Vec<&SymbolDeclaration> = index
        .declarations_in(file)
        .iter()
        .filter(|d| d.overlaps(range))
        .collect();
    defined.sort_by(|a, b| {
        (a.start_line, a.kind.as_str()).cmp(&(b.start_line, b.kind.as_str()))
    });

    let mut seen = HashSet::new();
    let referenced: Vec<ReferencedSymbol> = index
        .references_in(file)
        .iter()
        .filter(|r| range.contains(r.line) && seen.insert(r.name.as_str()))
        .map(|r| ReferencedSymbol {
            name: r.name.clone(),
            line: r.line,
        })
        .collect();

    let dependencies: BTreeSet<PathBuf> = referenced
        .iter()
        .flat_map(|r| index.declarations_named(&r.name))
        .filter(|d| d.file != file)
        .map(|d| d.file.clone())
        .collect();

    let defined_names: BTreeSet<&str> = defined.iter().map(|d| d.name.as_str()).collect();

    let mut impacted_files = BTreeSet::new();
    let mut usages = BTreeMap::new();
    for &name in &defined_names {
        let sites: Vec<Usage> = index
            .references_to(name)
            .map(|r| Usage {
                file: r.file.clone(),
                line: r.line,
            })
            .collect();
        impacted_files.extend(
            sites
                .iter()
                .filter(|u| u.file != file)
                .map(|u| u.file.clone()),
        );
        usages.insert(name.to_string(), sites);
    }

    let defined_types: BTreeSet<&str> = defined
        .iter()
        .filter(|d| d.kind.is_type())
        .map(|d| d.name.as_str())
        .collect();
    let conformances = index
        .conformances()
        .filter(|c| defined_types.contains(c.subtype.as_str()))
        .cloned()
        .collect();

    Ok(ImpactResult {
        file: file.to_path_buf(),
        lines: Some(range),
        symbols_in_range: SymbolsInRange {
            defined: defined.into_iter().map(DefinedSymbol::from).collect(),
            referenced,
        },
        dependencies: dependencies.into_iter().collect(),
        impacted_files: impacted_files.into_iter().collect(),
        usages,
        conformances,
    })
}
