//! Scan and storage configuration.
//!
//! Configuration is convention-based. A project may override the defaults
//! with `.depgraph/config.yaml`:
//!
//! ```yaml
//! extensions: [swift]
//! exclude-dirs: [.git, .build, Pods]
//! include-hidden: false
//! index-path: .depgraph/index.db
//! max-file-bytes: 4194304
//! threads: 4
//! ```
//!
//! Omitted keys keep their defaults; unknown keys are rejected.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the per-project depgraph directory
pub const DEPGRAPH_DIR_NAME: &str = ".depgraph";

/// Name of the configuration file inside [`DEPGRAPH_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default index location, relative to the project root
pub const DEFAULT_INDEX_PATH: &str = ".depgraph/index.db";

/// Default per-file size limit (4 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 4 * 1024 * 1024;

/// Directory names skipped by default (version control, build output, vendored deps).
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    ".build",
    ".swiftpm",
    ".depgraph",
    "build",
    "DerivedData",
    "Pods",
    "Carthage",
    "node_modules",
];

/// Configuration for scanning and indexing a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScanConfig {
    /// Source file extensions to index (without the leading dot)
    pub extensions: Vec<String>,

    /// Directory names skipped anywhere in the tree
    pub exclude_dirs: Vec<String>,

    /// Whether to descend into hidden directories (names starting with `.`)
    pub include_hidden: bool,

    /// Index file location, relative to the project root
    pub index_path: PathBuf,

    /// Files larger than this are skipped with a warning
    pub max_file_bytes: u64,

    /// Worker threads for extraction (`None` = one per core)
    pub threads: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["swift".to_string()],
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(ToString::to_string).collect(),
            include_hidden: false,
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            threads: None,
        }
    }
}

impl ScanConfig {
    /// Load `.depgraph/config.yaml` under `root`, or the defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but cannot be parsed or
    /// fails validation.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(DEPGRAPH_DIR_NAME).join(CONFIG_FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                Self::from_yaml(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Config(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Parse and validate a YAML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed YAML, unknown keys, or invalid values.
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(Error::Config("extensions must not be empty".to_string()));
        }
        if let Some(ext) = self.extensions.iter().find(|e| e.starts_with('.') || e.is_empty()) {
            return Err(Error::Config(format!(
                "extension '{ext}' must be non-empty and given without a leading dot"
            )));
        }
        if self.index_path.is_absolute() {
            return Err(Error::Config(format!(
                "index-path must be relative to the project root, got {}",
                self.index_path.display()
            )));
        }
        if self.threads == Some(0) {
            return Err(Error::Config("threads must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Whether a file name carries one of the configured extensions.
    #[must_use]
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Whether a directory with this name should be skipped.
    #[must_use]
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        (!self.include_hidden && name.starts_with('.'))
            || self.exclude_dirs.iter().any(|d| d == name)
    }

    /// Absolute index location for a project root.
    #[must_use]
    pub fn index_location(&self, root: &Path) -> PathBuf {
        root.join(&self.index_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_target_swift_and_skip_build_output() {
        let config = ScanConfig::default();

        assert_eq!(config.extensions, vec!["swift".to_string()]);
        assert!(config.is_excluded_dir(".git"));
        assert!(config.is_excluded_dir(".build"));
        assert!(config.is_excluded_dir("DerivedData"));
        assert!(!config.is_excluded_dir("Sources"));
        assert_eq!(config.index_path, PathBuf::from(".depgraph/index.db"));
    }

    #[test]
    fn hidden_dirs_skipped_unless_enabled() {
        let mut config = ScanConfig::default();
        assert!(config.is_excluded_dir(".hidden"));

        config.include_hidden = true;
        assert!(!config.is_excluded_dir(".hidden"));
        assert!(config.is_excluded_dir(".git"), "explicit excludes still apply");
    }

    #[rstest]
    #[case("App.swift", true)]
    #[case("App.SWIFT", true)]
    #[case("App.m", false)]
    #[case("Makefile", false)]
    fn extension_matching(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(
            ScanConfig::default().matches_extension(Path::new(name)),
            expected
        );
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let config = ScanConfig::from_yaml("threads: 2\nmax-file-bytes: 1024\n").unwrap();

        assert_eq!(config.threads, Some(2));
        assert_eq!(config.max_file_bytes, 1024);
        assert_eq!(config.extensions, vec!["swift".to_string()]);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(ScanConfig::from_yaml("").unwrap(), ScanConfig::default());
    }

    #[rstest]
    #[case("unknown-key: true\n")]
    #[case("extensions: []\n")]
    #[case("extensions: [.swift]\n")]
    #[case("index-path: /tmp/index.db\n")]
    #[case("threads: 0\n")]
    #[case("threads: [not, a, number]\n")]
    fn invalid_yaml_is_config_error(#[case] yaml: &str) {
        let err = ScanConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err:?}");
    }

    #[test]
    fn load_without_config_file_returns_defaults() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let config = ScanConfig::load(dir.path()).expect("load should succeed");
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn load_reads_project_config_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        std::fs::create_dir_all(dir.path().join(DEPGRAPH_DIR_NAME)).unwrap();
        std::fs::write(
            dir.path().join(DEPGRAPH_DIR_NAME).join(CONFIG_FILE_NAME),
            "exclude-dirs: [Generated]\n",
        )
        .unwrap();

        let config = ScanConfig::load(dir.path()).expect("load should succeed");
        assert!(config.is_excluded_dir("Generated"));
        assert!(!config.is_excluded_dir("Pods"), "list replaces defaults");
    }
}
