//! Domain types for depgraph.
//!
//! These types represent the core domain model:
//! - **Entities**: `SourceFile`, `SymbolDeclaration`, `SymbolReference`,
//!   `ConformanceEdge` (owned by the [`Index`](crate::Index) and persisted)
//! - **Query inputs**: `LineRange`
//! - **Results**: `ImpactResult`, `IndexStats`, `StaleReport` (never persisted)
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | Symbol kind | Closed enum | Exhaustive matching for every consumer |
//! | Paths | Project-relative `PathBuf` | Index stays valid if the project moves |
//! | Lines | 1-indexed, inclusive | Matches editor and `--lines` conventions |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, ExtractionWarning};

// ============================================================================
// Enums
// ============================================================================

/// Kinds of declarations recognized by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// `class` or `actor`
    Class,
    /// `struct`
    Struct,
    /// `enum`
    Enum,
    /// `protocol`
    Protocol,
    /// `extension` (named after the extended type)
    Extension,
    /// `func`
    Function,
    /// `var` or `let` at file or type scope
    Variable,
    /// `typealias`
    #[serde(rename = "typealias")]
    TypeAlias,
    /// `init`
    Initializer,
    /// `case` inside an enum body
    EnumCase,
}

impl SymbolKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Class,
        Self::Struct,
        Self::Enum,
        Self::Protocol,
        Self::Extension,
        Self::Function,
        Self::Variable,
        Self::TypeAlias,
        Self::Initializer,
        Self::EnumCase,
    ];

    /// Convert to database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Protocol => "protocol",
            Self::Extension => "extension",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::TypeAlias => "typealias",
            Self::Initializer => "initializer",
            Self::EnumCase => "enum_case",
        }
    }

    /// Whether this kind introduces a type body that can carry conformances.
    #[must_use]
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Self::Class | Self::Struct | Self::Enum | Self::Protocol | Self::Extension
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown symbol kind '{s}'"))
    }
}

// ============================================================================
// Core Entities (owned by the Index)
// ============================================================================

/// A source file known to the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the project root
    pub path: PathBuf,
    /// xxh3-64 of the file content (for change detection)
    pub content_hash: u64,
    /// Number of lines at the time of indexing
    pub line_count: u32,
}

/// A named declaration and the lines it spans.
///
/// Identified by `(file, name, start_line)`; names alone are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolDeclaration {
    /// Simple name (`helper`, `init`, `Foo` for `extension Foo`)
    pub name: String,
    /// What kind of declaration this is
    pub kind: SymbolKind,
    /// File that owns the declaration, relative to the project root
    pub file: PathBuf,
    /// First line of the declaration, including attributes and modifiers
    pub start_line: u32,
    /// Last line of the declaration body (inclusive)
    pub end_line: u32,
    /// Number of enclosing declarations (0 = top level)
    pub depth: u32,
    /// Name of the innermost enclosing declaration, if any
    pub container: Option<String>,
}

impl SymbolDeclaration {
    /// Whether the declaration's span overlaps `range`.
    #[must_use]
    pub fn overlaps(&self, range: LineRange) -> bool {
        self.start_line <= range.end && self.end_line >= range.start
    }

    /// Whether this declaration sits at file scope.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.depth == 0
    }
}

/// A use-site of a name outside its own declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolReference {
    /// Referenced name
    pub name: String,
    /// File containing the use-site, relative to the project root
    pub file: PathBuf,
    /// Line of the use-site (1-indexed)
    pub line: u32,
}

/// A directed subtype -> supertype/protocol relationship.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConformanceEdge {
    /// Conforming or inheriting type
    pub subtype: String,
    /// Protocol or superclass
    pub supertype: String,
    /// File containing the declaration that introduced the edge
    pub file: PathBuf,
}

// ============================================================================
// Query Inputs
// ============================================================================

/// An inclusive, 1-based line range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    /// First line (1-indexed)
    pub start: u32,
    /// Last line (inclusive)
    pub end: u32,
}

impl LineRange {
    /// Create a validated range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if either bound is zero or `start > end`.
    pub fn new(start: u32, end: u32) -> crate::Result<Self> {
        let input = format!("{start}:{end}");
        if start == 0 || end == 0 {
            return Err(Error::InvalidRange {
                input,
                reason: "line numbers are 1-based".to_string(),
            });
        }
        if start > end {
            return Err(Error::InvalidRange {
                input,
                reason: format!("start line {start} is after end line {end}"),
            });
        }
        Ok(Self { start, end })
    }

    /// Whether `line` falls within the range.
    #[must_use]
    pub fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }
}

impl FromStr for LineRange {
    type Err = Error;

    /// Parse `START:END`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::InvalidRange {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| invalid("expected START:END"))?;
        let start: u32 = start
            .trim()
            .parse()
            .map_err(|_| invalid("start is not a line number"))?;
        let end: u32 = end
            .trim()
            .parse()
            .map_err(|_| invalid("end is not a line number"))?;

        Self::new(start, end).map_err(|e| match e {
            Error::InvalidRange { reason, .. } => invalid(&reason),
            other => other,
        })
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

// ============================================================================
// Query Results
// ============================================================================

/// A declaration reported in `symbolsInRange.defined`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinedSymbol {
    /// Declared name
    pub name: String,
    /// Declaration kind
    pub kind: SymbolKind,
    /// First line of the declaration (1-indexed)
    pub start_line: u32,
    /// Last line of the declaration (inclusive)
    pub end_line: u32,
}

impl From<&SymbolDeclaration> for DefinedSymbol {
    fn from(decl: &SymbolDeclaration) -> Self {
        Self {
            name: decl.name.clone(),
            kind: decl.kind,
            start_line: decl.start_line,
            end_line: decl.end_line,
        }
    }
}

/// A name referenced in range, with the first line it appears on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedSymbol {
    /// Referenced name
    pub name: String,
    /// First line in range where the name appears
    pub line: u32,
}

/// Declarations and references found within the queried range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolsInRange {
    /// Declarations overlapping the range
    pub defined: Vec<DefinedSymbol>,
    /// Names used on lines within the range
    pub referenced: Vec<ReferencedSymbol>,
}

/// One use-site of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Usage {
    /// Project-relative path of the referencing file
    pub file: PathBuf,
    /// Line of the reference (1-indexed)
    pub line: u32,
}

/// Answer to an impact query. Computed per query, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactResult {
    /// File the query was run against
    pub file: PathBuf,
    /// Queried lines
    pub lines: Option<LineRange>,
    /// What the range defines and uses
    pub symbols_in_range: SymbolsInRange,
    /// Files declaring a name referenced in range (excluding `file`)
    pub dependencies: Vec<PathBuf>,
    /// Files referencing a name defined in range (excluding `file`)
    pub impacted_files: Vec<PathBuf>,
    /// Every use-site of each defined name, sorted by file then line
    pub usages: BTreeMap<String, Vec<Usage>>,
    /// Conformance edges introduced by types defined in range
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conformances: Vec<ConformanceEdge>,
}

/// Statistics from a full index build.
///
/// Returned by [`DepGraph::index()`](crate::DepGraph::index).
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    /// Files successfully extracted
    pub files_indexed: usize,
    /// Files skipped because they could not be read
    pub files_skipped: usize,
    /// Declarations across all files
    pub declarations_found: usize,
    /// References across all files
    pub references_found: usize,
    /// Conformance edges across all files
    pub conformances_found: usize,
    /// How long the build took
    pub duration: Duration,
    /// Directories that could not be read (path, error reason)
    pub directories_skipped: Vec<(PathBuf, String)>,
    /// File-level problems (non-fatal)
    pub warnings: Vec<ExtractionWarning>,
}

/// Differences between a stored index and the current project tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaleReport {
    /// Files on disk that are not in the index
    pub added: Vec<PathBuf>,
    /// Indexed files that no longer exist
    pub deleted: Vec<PathBuf>,
    /// Indexed files whose content hash changed
    pub modified: Vec<PathBuf>,
}

impl StaleReport {
    /// Whether the file set changed since the last index.
    ///
    /// Content-only edits do not count.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn decl(start_line: u32, end_line: u32) -> SymbolDeclaration {
        SymbolDeclaration {
            name: "helper".to_string(),
            kind: SymbolKind::Function,
            file: PathBuf::from("A.swift"),
            start_line,
            end_line,
            depth: 0,
            container: None,
        }
    }

    #[test]
    fn symbol_kind_round_trips_through_str() {
        for kind in SymbolKind::ALL {
            assert_eq!(kind.as_str().parse::<SymbolKind>(), Ok(kind));
        }
    }

    #[test]
    fn symbol_kind_json_matches_display() {
        for kind in SymbolKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::from(kind.to_string()));
        }
        assert_eq!(serde_json::to_string(&SymbolKind::TypeAlias).unwrap(), "\"typealias\"");
    }

    #[test]
    fn symbol_kind_rejects_unknown_str() {
        assert!("macro".parse::<SymbolKind>().is_err());
    }

    #[rstest]
    #[case("10:15", 10, 15)]
    #[case("7:7", 7, 7)]
    #[case(" 3 : 4 ", 3, 4)]
    fn line_range_parses_valid_input(#[case] input: &str, #[case] start: u32, #[case] end: u32) {
        let range: LineRange = input.parse().expect("range should parse");
        assert_eq!(range, LineRange { start, end });
    }

    #[rstest]
    #[case("30:10")]
    #[case("0:5")]
    #[case("10")]
    #[case("a:b")]
    #[case("-1:3")]
    #[case("")]
    fn line_range_rejects_malformed_input(#[case] input: &str) {
        let err = input.parse::<LineRange>().unwrap_err();
        match err {
            Error::InvalidRange { input: echoed, .. } => assert_eq!(echoed, input),
            other => panic!("expected InvalidRange, got {other:?}"),
        }
    }

    #[test]
    fn inverted_range_reason_names_both_bounds() {
        let err = "30:10".parse::<LineRange>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("30:10"), "message was: {message}");
        assert!(message.contains("after"), "message was: {message}");
    }

    #[rstest]
    #[case(10, 15, true)] // exact span
    #[case(12, 13, true)] // inside
    #[case(1, 10, true)] // touches start
    #[case(15, 20, true)] // touches end
    #[case(1, 9, false)]
    #[case(16, 30, false)]
    fn declaration_overlap(#[case] start: u32, #[case] end: u32, #[case] expected: bool) {
        let range = LineRange::new(start, end).unwrap();
        assert_eq!(decl(10, 15).overlaps(range), expected);
    }

    #[test]
    fn stale_report_ignores_content_only_changes() {
        let report = StaleReport {
            modified: vec![PathBuf::from("A.swift")],
            ..StaleReport::default()
        };
        assert!(!report.is_stale());

        let report = StaleReport {
            added: vec![PathBuf::from("B.swift")],
            ..StaleReport::default()
        };
        assert!(report.is_stale());
    }

    #[test]
    fn impact_result_serializes_with_documented_field_names() {
        let result = ImpactResult {
            file: PathBuf::from("A.swift"),
            ..ImpactResult::default()
        };
        let json = serde_json::to_value(&result).unwrap();

        assert!(json["symbolsInRange"]["defined"].is_array());
        assert!(json["symbolsInRange"]["referenced"].is_array());
        assert!(json["dependencies"].is_array());
        assert!(json["impactedFiles"].is_array());
        assert!(json["usages"].is_object());
        assert!(json.get("conformances").is_none());
    }
}
