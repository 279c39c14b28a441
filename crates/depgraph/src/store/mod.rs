//! `SQLite` persistence for the index.
//!
//! The stored index is a single `SQLite` file, by default
//! `<root>/.depgraph/index.db`. It is always written whole: [`IndexStore::save`]
//! builds a fresh database next to the target and renames it into place, so
//! readers see either the previous index or the new one, never a mix.
//!
//! ## Module Structure
//!
//! - `schema` - Database schema (DDL) and version tag
//! - `rows` - Row conversion and column lists
//!
//! ## Staleness
//!
//! | Change since indexing | `StaleReport` field | Stale? |
//! |-----------------------|---------------------|--------|
//! | File added            | `added`             | yes    |
//! | File removed          | `deleted`           | yes    |
//! | File content edited   | `modified`          | no     |

mod rows;
mod schema;

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use self::rows::{
    hash_to_sql, normalize_path, row_to_conformance, row_to_declaration, row_to_file,
    row_to_reference, CONFORMANCES_COLUMNS, DECLARATIONS_COLUMNS, FILES_COLUMNS, REFS_COLUMNS,
};
use self::schema::{SCHEMA, SCHEMA_VERSION};
use crate::config::ScanConfig;
use crate::error::{Error, Result};
use crate::index::Index;
use crate::indexer::{content_hash, relative_path};
use crate::scanner::SourceScanner;
use crate::types::StaleReport;

/// Metadata recorded alongside a stored index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreMetadata {
    /// Layout version the database was written with
    pub schema_version: u32,
    /// Project root the index was built from
    pub root: PathBuf,
    /// Seconds since the Unix epoch when the index was saved
    pub indexed_at: u64,
}

/// Handle to an on-disk index location.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    /// Create a handle for `path`. Nothing is read or created until used.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the index file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an index file exists at this location.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    // === Writing ===

    /// Persist `index`, replacing any existing stored index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] or [`Error::Io`] if the index cannot be
    /// written. On failure the previously stored index is left untouched.
    pub fn save(&self, index: &Index, root: &Path) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        if tmp.exists() {
            fs::remove_file(&tmp)?;
        }

        let written = Self::write_database(&tmp, index, root);
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        fs::rename(&tmp, &self.path)?;
        info!(
            path = %self.path.display(),
            files = index.file_count(),
            declarations = index.declaration_count(),
            "Index saved"
        );
        Ok(())
    }

    fn write_database(path: &Path, index: &Index, root: &Path) -> Result<()> {
        let mut conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        {
            let mut meta = tx.prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")?;
            meta.execute(params!["schema_version", SCHEMA_VERSION.to_string()])?;
            meta.execute(params!["root", normalize_path(root)])?;
            meta.execute(params!["indexed_at", now_secs()?.to_string()])?;

            let mut file_stmt = tx.prepare(&format!(
                "INSERT INTO files ({FILES_COLUMNS}) VALUES (?1, ?2, ?3)"
            ))?;
            for file in index.files() {
                file_stmt.execute(params![
                    normalize_path(&file.path),
                    hash_to_sql(file.content_hash),
                    file.line_count
                ])?;
            }

            let mut skipped_stmt = tx.prepare("INSERT INTO skipped_files (path) VALUES (?1)")?;
            for path in index.skipped_files() {
                skipped_stmt.execute(params![normalize_path(path)])?;
            }

            let mut decl_stmt = tx.prepare(&format!(
                "INSERT INTO declarations ({DECLARATIONS_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ))?;
            for decl in index.declarations() {
                decl_stmt.execute(params![
                    normalize_path(&decl.file),
                    decl.name,
                    decl.kind.as_str(),
                    decl.start_line,
                    decl.end_line,
                    decl.depth,
                    decl.container
                ])?;
            }

            let mut ref_stmt = tx.prepare(&format!(
                "INSERT INTO refs ({REFS_COLUMNS}) VALUES (?1, ?2, ?3)"
            ))?;
            for reference in index.references() {
                ref_stmt.execute(params![
                    normalize_path(&reference.file),
                    reference.line,
                    reference.name
                ])?;
            }

            let mut conf_stmt = tx.prepare(&format!(
                "INSERT INTO conformances ({CONFORMANCES_COLUMNS}) VALUES (?1, ?2, ?3)"
            ))?;
            for edge in index.conformances() {
                conf_stmt.execute(params![
                    edge.subtype,
                    edge.supertype,
                    normalize_path(&edge.file)
                ])?;
            }
        }
        tx.commit()?;
        conn.close().map_err(|(_, e)| Error::Database(e))?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    // === Reading ===

    /// Load the stored index.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] with `NotFound` if no index exists at this location
    /// - [`Error::CorruptIndex`] if the file is unreadable, not an index, or
    ///   was written with a different schema version
    pub fn load(&self) -> Result<Index> {
        let conn = self.open_checked()?;

        let index = Self::read_index(&conn).map_err(|e| self.corrupt(e.to_string()))?;
        debug!(
            path = %self.path.display(),
            files = index.file_count(),
            "Index loaded"
        );
        Ok(index)
    }

    /// Read the metadata of the stored index.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn metadata(&self) -> Result<StoreMetadata> {
        let conn = self.open_checked()?;
        let root = read_meta(&conn, "root")
            .map_err(|e| self.corrupt(e.to_string()))?
            .unwrap_or_default();
        let indexed_at = read_meta(&conn, "indexed_at")
            .map_err(|e| self.corrupt(e.to_string()))?
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Ok(StoreMetadata {
            schema_version: SCHEMA_VERSION,
            root: PathBuf::from(root),
            indexed_at,
        })
    }

    /// Open read-only and verify the schema version.
    fn open_checked(&self) -> Result<Connection> {
        if !self.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no index at {}", self.path.display()),
            )));
        }

        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| self.corrupt(e.to_string()))?;

        let version = read_meta(&conn, "schema_version").map_err(|e| self.corrupt(e.to_string()))?;
        match version.as_deref().map(str::parse::<u32>) {
            Some(Ok(v)) if v == SCHEMA_VERSION => Ok(conn),
            Some(Ok(v)) => Err(self.corrupt(format!(
                "schema version {v} is not supported (expected {SCHEMA_VERSION})"
            ))),
            Some(Err(_)) | None => Err(self.corrupt("missing schema version".to_string())),
        }
    }

    fn read_index(conn: &Connection) -> rusqlite::Result<Index> {
        let files = query_all(conn, &format!("SELECT {FILES_COLUMNS} FROM files"), row_to_file)?;
        let declarations = query_all(
            conn,
            &format!("SELECT {DECLARATIONS_COLUMNS} FROM declarations ORDER BY id"),
            row_to_declaration,
        )?;
        let references = query_all(
            conn,
            &format!("SELECT {REFS_COLUMNS} FROM refs"),
            row_to_reference,
        )?;
        let conformances = query_all(
            conn,
            &format!("SELECT {CONFORMANCES_COLUMNS} FROM conformances"),
            row_to_conformance,
        )?;

        let skipped = query_all(conn, "SELECT path FROM skipped_files", |row| {
            row.get::<_, String>(0).map(PathBuf::from)
        })?;

        Ok(Index::from_parts(files, declarations, references, conformances).with_skipped(skipped))
    }

    /// Stored file paths with their content fingerprints, plus the paths
    /// that were skipped during the build.
    fn stored_file_set(&self) -> Result<(BTreeMap<PathBuf, u64>, BTreeSet<PathBuf>)> {
        let conn = self.open_checked()?;
        let files = query_all(&conn, &format!("SELECT {FILES_COLUMNS} FROM files"), row_to_file)
            .map_err(|e| self.corrupt(e.to_string()))?;
        let skipped = query_all(&conn, "SELECT path FROM skipped_files", |row| {
            row.get::<_, String>(0).map(PathBuf::from)
        })
        .map_err(|e| self.corrupt(e.to_string()))?;
        Ok((
            files
                .into_iter()
                .map(|f| (f.path, f.content_hash))
                .collect(),
            skipped.into_iter().collect(),
        ))
    }

    // === Staleness ===

    /// Compare the stored file set against the current state of `root`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::load`], or [`Error::Scan`] if `root`
    /// cannot be walked.
    pub fn stale_report(&self, root: &Path, config: &ScanConfig) -> Result<StaleReport> {
        let (stored, skipped) = self.stored_file_set()?;
        let (paths, _) = SourceScanner::new(root, config.clone()).collect()?;

        let mut report = StaleReport::default();
        let mut current = BTreeMap::new();
        for path in paths {
            current.insert(relative_path(root, &path), path);
        }

        for (relative, absolute) in &current {
            match stored.get(relative) {
                None if skipped.contains(relative) => {}
                None => report.added.push(relative.clone()),
                Some(&hash) => {
                    let unchanged = fs::read(absolute).is_ok_and(|bytes| content_hash(&bytes) == hash);
                    if !unchanged {
                        report.modified.push(relative.clone());
                    }
                }
            }
        }
        report.deleted = stored
            .into_keys()
            .chain(skipped)
            .filter(|p| !current.contains_key(p))
            .collect();
        report.deleted.sort();

        debug!(
            added = report.added.len(),
            deleted = report.deleted.len(),
            modified = report.modified.len(),
            "Staleness check"
        );
        Ok(report)
    }

    /// Whether files were added or removed under `root` since the index was
    /// saved. Content edits alone do not count.
    ///
    /// # Errors
    ///
    /// See [`Self::stale_report`].
    pub fn is_stale(&self, root: &Path, config: &ScanConfig) -> Result<bool> {
        Ok(self.stale_report(root, config)?.is_stale())
    }

    fn corrupt(&self, reason: String) -> Error {
        Error::CorruptIndex {
            path: self.path.clone(),
            reason,
        }
    }
}

fn read_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
        row.get(0)
    })
    .optional()
}

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    map: impl FnMut(&rusqlite::Row) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], map)?;
    rows.collect()
}

fn now_secs() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| Error::Config(format!("system clock is before Unix epoch: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConformanceEdge, SourceFile, SymbolDeclaration, SymbolKind, SymbolReference};
    use tempfile::TempDir;

    fn sample() -> Index {
        Index::from_parts(
            [
                SourceFile {
                    path: PathBuf::from("Sources/A.swift"),
                    content_hash: u64::MAX,
                    line_count: 20,
                },
                SourceFile {
                    path: PathBuf::from("Sources/B.swift"),
                    content_hash: 7,
                    line_count: 50,
                },
            ],
            [SymbolDeclaration {
                name: "helper".to_string(),
                kind: SymbolKind::Function,
                file: PathBuf::from("Sources/A.swift"),
                start_line: 10,
                end_line: 15,
                depth: 1,
                container: Some("Utilities".to_string()),
            }],
            [SymbolReference {
                name: "helper".to_string(),
                file: PathBuf::from("Sources/B.swift"),
                line: 42,
            }],
            [ConformanceEdge {
                subtype: "Utilities".to_string(),
                supertype: "Sendable".to_string(),
                file: PathBuf::from("Sources/A.swift"),
            }],
        )
    }

    fn store(dir: &TempDir) -> IndexStore {
        IndexStore::new(dir.path().join(".depgraph").join("index.db"))
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let index = sample();

        store.save(&index, dir.path()).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, index);
        assert!(!store.temp_path().exists(), "temp file is renamed away");
    }

    #[test]
    fn save_replaces_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store.save(&sample(), dir.path()).unwrap();
        store.save(&Index::default(), dir.path()).unwrap();

        assert_eq!(store.load().unwrap().file_count(), 0);
    }

    #[test]
    fn metadata_records_root_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&sample(), dir.path()).unwrap();

        let meta = store.metadata().unwrap();

        assert_eq!(meta.schema_version, SCHEMA_VERSION);
        assert_eq!(meta.root, PathBuf::from(normalize_path(dir.path())));
        assert!(meta.indexed_at > 0);
    }

    #[test]
    fn missing_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(&dir).load().unwrap_err();
        assert!(
            matches!(&err, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound),
            "got {err:?}"
        );
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "definitely not sqlite").unwrap();

        let err = store.load().unwrap_err();

        assert!(matches!(err, Error::CorruptIndex { .. }), "got {err:?}");
    }

    #[test]
    fn schema_version_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&sample(), dir.path()).unwrap();
        {
            let conn = Connection::open(store.path()).unwrap();
            conn.execute(
                "UPDATE meta SET value = '999' WHERE key = 'schema_version'",
                [],
            )
            .unwrap();
        }

        let err = store.load().unwrap_err();

        match err {
            Error::CorruptIndex { reason, .. } => assert!(reason.contains("999")),
            other => panic!("expected CorruptIndex, got {other:?}"),
        }
    }

    #[test]
    fn unknown_symbol_kind_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&sample(), dir.path()).unwrap();
        {
            let conn = Connection::open(store.path()).unwrap();
            conn.execute("UPDATE declarations SET kind = 'macro'", []).unwrap();
        }

        assert!(matches!(store.load().unwrap_err(), Error::CorruptIndex { .. }));
    }

    #[test]
    fn skipped_files_count_as_known_when_checking_staleness() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Sources")).unwrap();
        for name in ["A.swift", "B.swift", "Bad.swift"] {
            fs::write(dir.path().join("Sources").join(name), "").unwrap();
        }
        let store = store(&dir);
        let index = sample().with_skipped([PathBuf::from("Sources/Bad.swift")]);
        store.save(&index, dir.path()).unwrap();

        assert_eq!(store.load().unwrap(), index);
        let report = store.stale_report(dir.path(), &ScanConfig::default()).unwrap();
        assert!(report.added.is_empty(), "{report:?}");
        assert!(!report.is_stale());

        fs::remove_file(dir.path().join("Sources/Bad.swift")).unwrap();
        let report = store.stale_report(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(report.deleted, vec![PathBuf::from("Sources/Bad.swift")]);
    }
}
