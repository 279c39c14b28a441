//! Database schema definition for the stored index.

/// Version of the layout below. Bump on any incompatible change; loaders
/// treat a mismatch as a corrupt index and rebuild.
pub(crate) const SCHEMA_VERSION: u32 = 2;

/// Database schema definition.
pub(crate) const SCHEMA: &str = r"
-- Key/value metadata: schema_version, root, indexed_at
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Indexed source files with content fingerprints
CREATE TABLE IF NOT EXISTS files (
    path TEXT PRIMARY KEY,
    content_hash INTEGER NOT NULL,
    line_count INTEGER NOT NULL
);

-- Source files found by the scan but excluded from extraction
CREATE TABLE IF NOT EXISTS skipped_files (
    path TEXT PRIMARY KEY
);

-- Symbol declarations
CREATE TABLE IF NOT EXISTS declarations (
    id INTEGER PRIMARY KEY,
    file TEXT NOT NULL REFERENCES files(path) ON DELETE CASCADE,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    depth INTEGER NOT NULL,
    container TEXT
);

CREATE INDEX IF NOT EXISTS idx_declarations_name ON declarations(name);
CREATE INDEX IF NOT EXISTS idx_declarations_file ON declarations(file);

-- Use sites, unique per (file, line, name)
CREATE TABLE IF NOT EXISTS refs (
    file TEXT NOT NULL REFERENCES files(path) ON DELETE CASCADE,
    line INTEGER NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY (file, line, name)
);

CREATE INDEX IF NOT EXISTS idx_refs_name ON refs(name);

-- Direct conformance edges (subtype -> supertype)
CREATE TABLE IF NOT EXISTS conformances (
    subtype TEXT NOT NULL,
    supertype TEXT NOT NULL,
    file TEXT NOT NULL REFERENCES files(path) ON DELETE CASCADE,
    PRIMARY KEY (subtype, supertype, file)
);
";
