//! Row conversion between database representations and domain types.

use std::path::{Path, PathBuf};

use crate::types::{ConformanceEdge, SourceFile, SymbolDeclaration, SymbolKind, SymbolReference};

/// SQL column list for the files table. Use with [`row_to_file`].
pub(crate) const FILES_COLUMNS: &str = "path, content_hash, line_count";

/// SQL column list for the declarations table. Use with [`row_to_declaration`].
pub(crate) const DECLARATIONS_COLUMNS: &str =
    "file, name, kind, start_line, end_line, depth, container";

/// SQL column list for the refs table. Use with [`row_to_reference`].
pub(crate) const REFS_COLUMNS: &str = "file, line, name";

/// SQL column list for the conformances table. Use with [`row_to_conformance`].
pub(crate) const CONFORMANCES_COLUMNS: &str = "subtype, supertype, file";

/// Normalize a path to forward slashes for storage.
///
/// Stored indexes stay readable on every platform regardless of where they
/// were written.
pub(crate) fn normalize_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

/// Store a `u64` fingerprint in a signed `INTEGER` column, bit for bit.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn hash_to_sql(hash: u64) -> i64 {
    hash as i64
}

#[allow(clippy::cast_sign_loss)]
fn hash_from_sql(value: i64) -> u64 {
    value as u64
}

/// Parse a symbol kind string from the database.
///
/// Returns an error for unrecognized values, indicating a corrupt index or
/// one written by a newer version.
pub(crate) fn parse_symbol_kind(s: &str) -> rusqlite::Result<SymbolKind> {
    s.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
    })
}

pub(crate) fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<SourceFile> {
    Ok(SourceFile {
        path: PathBuf::from(row.get::<_, String>(0)?),
        content_hash: hash_from_sql(row.get(1)?),
        line_count: row.get(2)?,
    })
}

pub(crate) fn row_to_declaration(row: &rusqlite::Row) -> rusqlite::Result<SymbolDeclaration> {
    let kind: String = row.get(2)?;
    Ok(SymbolDeclaration {
        file: PathBuf::from(row.get::<_, String>(0)?),
        name: row.get(1)?,
        kind: parse_symbol_kind(&kind)?,
        start_line: row.get(3)?,
        end_line: row.get(4)?,
        depth: row.get(5)?,
        container: row.get(6)?,
    })
}

pub(crate) fn row_to_reference(row: &rusqlite::Row) -> rusqlite::Result<SymbolReference> {
    Ok(SymbolReference {
        file: PathBuf::from(row.get::<_, String>(0)?),
        line: row.get(1)?,
        name: row.get(2)?,
    })
}

pub(crate) fn row_to_conformance(row: &rusqlite::Row) -> rusqlite::Result<ConformanceEdge> {
    Ok(ConformanceEdge {
        subtype: row.get(0)?,
        supertype: row.get(1)?,
        file: PathBuf::from(row.get::<_, String>(2)?),
    })
}
