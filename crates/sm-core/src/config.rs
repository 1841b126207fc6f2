//! Configuration structures for smartui-migrate.
//!
//! - [`ScanConfig`] - Walker settings (extra skip dirs, links, parallelism)
//! - [`CheckpointConfig`] - Checkpoint store location and retention
//! - [`ApplyConfig`] - Defaults for the apply pass
//! - [`Config`] - Root configuration combining all settings
//!
//! Configuration is read from [`Config::FILE_NAME`] in the project root when
//! present; every field has a default, so partial files are fine. The CLI
//! layers flags and `SMARTUI_MIGRATE_*` environment variables on top.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for project walking.
///
/// # Examples
///
/// ```
/// use sm_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert!(config.extra_skip_dirs.is_empty());
/// assert!(!config.follow_links);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names skipped in addition to the built-in list.
    pub extra_skip_dirs: Vec<String>,

    /// Whether to follow symbolic links while walking.
    pub follow_links: bool,

    /// Maximum number of parallel analysis jobs.
    /// `None` means use all available CPU cores.
    pub max_parallel_jobs: Option<usize>,
}

/// Configuration for the checkpoint store.
///
/// # Examples
///
/// ```
/// use sm_core::CheckpointConfig;
///
/// let config = CheckpointConfig::default();
/// assert_eq!(config.store_dir, ".smartui-migrate");
/// assert_eq!(config.max_checkpoints, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Store directory, relative to the project root.
    pub store_dir: Utf8PathBuf,

    /// Retained checkpoint records. Once exceeded, the oldest committed or
    /// deleted records are pruned; live checkpoints are never pruned.
    pub max_checkpoints: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            store_dir: Utf8PathBuf::from(".smartui-migrate"),
            max_checkpoints: 20,
        }
    }
}

/// Defaults for the apply pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Take a checkpoint before writing.
    pub create_backup: bool,

    /// Ask before writing each file.
    pub confirm_each_file: bool,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            create_backup: true,
            confirm_each_file: false,
        }
    }
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use sm_core::Config;
///
/// let config = Config::default();
/// assert!(config.apply.create_backup);
/// let json = serde_json::to_string_pretty(&config);
/// assert!(json.is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Walker configuration.
    pub scan: ScanConfig,

    /// Checkpoint store configuration.
    pub checkpoint: CheckpointConfig,

    /// Apply defaults.
    pub apply: ApplyConfig,
}

impl Config {
    /// Name of the optional configuration file in the project root.
    pub const FILE_NAME: &'static str = ".smartui-migrate.json";

    /// Loads configuration for `root`, falling back to defaults when the file
    /// is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory, the file cannot be read
    /// or parsed, or a value is out of range.
    pub fn load(root: &Utf8Path) -> Result<Self, ConfigError> {
        if !root.is_dir() {
            return Err(ConfigError::MissingDirectory(root.to_owned()));
        }

        let path = root.join(Self::FILE_NAME);
        let config = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] or [`ConfigError::InvalidPath`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.max_parallel_jobs == Some(0) {
            return Err(ConfigError::invalid_option(
                "scan.max_parallel_jobs",
                "must be at least 1",
            ));
        }
        if self.checkpoint.max_checkpoints == 0 {
            return Err(ConfigError::invalid_option(
                "checkpoint.max_checkpoints",
                "must be at least 1",
            ));
        }
        if self.checkpoint.store_dir.as_str().is_empty() || self.checkpoint.store_dir.is_absolute()
        {
            return Err(ConfigError::InvalidPath {
                path: self.checkpoint.store_dir.clone(),
                reason: "store directory must be relative to the project root".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp path")
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let parsed: Config = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"scan": {"extra_skip_dirs": ["fixtures"]}}"#;
        let config: Config = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.scan.extra_skip_dirs, vec!["fixtures"]);
        assert_eq!(config.checkpoint.max_checkpoints, 20);
        assert!(config.apply.create_backup);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(&utf8_root(&dir)).expect("load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(Config::FILE_NAME),
            r#"{"apply": {"create_backup": false}, "scan": {"max_parallel_jobs": 2}}"#,
        )
        .expect("write config");
        let config = Config::load(&utf8_root(&dir)).expect("load");
        assert!(!config.apply.create_backup);
        assert_eq!(config.scan.max_parallel_jobs, Some(2));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(Config::FILE_NAME),
            r#"{"scan": {"max_parallel_jobs": 0}}"#,
        )
        .expect("write config");
        let err = Config::load(&utf8_root(&dir)).expect_err("zero jobs");
        assert!(matches!(err, ConfigError::InvalidOption { .. }));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(Config::FILE_NAME), "{ not json").expect("write");
        let err = Config::load(&utf8_root(&dir)).expect_err("bad json");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_root() {
        let err = Config::load(Utf8Path::new("/definitely/not/here")).expect_err("missing");
        assert!(matches!(err, ConfigError::MissingDirectory(_)));
    }
}
