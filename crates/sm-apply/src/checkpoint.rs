//! Checkpoint records and their lifecycle.
//!
//! A [`Checkpoint`] holds the full original content of every file a run is
//! about to change. Records are independent of each other: restoring one
//! never needs another.
//!
//! ```text
//! created ──► committed ──┐
//!    │                    ├──► deleted
//!    └──────► rolled-back ┘
//! ```

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sm_core::{DetectionResult, Framework, Language, MAPPING_TABLE_VERSION, Platform};
use uuid::Uuid;

/// Lifecycle state of a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckpointState {
    /// Persisted before the run's first write.
    Created,
    /// The migration was confirmed stable.
    Committed,
    /// Files were restored from the checkpoint.
    RolledBack,
    /// Content dropped; only a tombstone remains.
    Deleted,
}

impl CheckpointState {
    /// Returns `true` if `next` may follow `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sm_apply::CheckpointState;
    ///
    /// assert!(CheckpointState::Created.can_transition_to(CheckpointState::RolledBack));
    /// assert!(!CheckpointState::Deleted.can_transition_to(CheckpointState::RolledBack));
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Committed | Self::RolledBack)
                | (Self::Committed | Self::RolledBack, Self::Deleted)
        )
    }

    /// Returns `true` while files can still be restored.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Created)
    }
}

impl fmt::Display for CheckpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
            Self::Deleted => "deleted",
        })
    }
}

/// Full original content of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBackup {
    /// Root-relative path.
    pub path: Utf8PathBuf,
    /// Content before the run.
    pub content: String,
    /// SHA-256 of `content`, lowercase hex.
    pub checksum: String,
    /// Size in bytes.
    pub size: u64,
    /// When the file was read.
    pub timestamp: DateTime<Utc>,
}

/// What the checkpoint was taken for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Source platform of the run.
    pub platform: Option<Platform>,
    /// Framework of the run.
    pub framework: Option<Framework>,
    /// Ecosystem of the run.
    pub language: Option<Language>,
    /// Files backed up, manifests included.
    pub file_count: usize,
    /// Total bytes backed up.
    pub total_size: u64,
    /// Mapping tables the run used.
    pub mapping_version: String,
}

impl CheckpointMetadata {
    /// Metadata for a run over `detection`. Counts are filled in when the
    /// checkpoint is created.
    #[must_use]
    pub fn for_detection(detection: &DetectionResult) -> Self {
        Self {
            platform: Some(detection.platform),
            framework: Some(detection.framework),
            language: Some(detection.language),
            file_count: 0,
            total_size: 0,
            mapping_version: MAPPING_TABLE_VERSION.to_owned(),
        }
    }
}

/// A request to snapshot files before a run.
#[derive(Debug, Clone, Default)]
pub struct CheckpointRequest {
    /// Human-readable purpose.
    pub description: String,
    /// Run metadata.
    pub metadata: CheckpointMetadata,
    /// Root-relative files the run will write. Those that do not exist yet
    /// are recorded as artifacts.
    pub files: Vec<Utf8PathBuf>,
    /// Root-relative files the run will create.
    pub artifacts: Vec<Utf8PathBuf>,
}

/// A persisted, restorable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Unique id.
    pub id: Uuid,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Human-readable purpose.
    pub description: String,
    /// Lifecycle state.
    pub state: CheckpointState,
    /// Backed-up source, CI and configuration files, in request order.
    pub files: Vec<FileBackup>,
    /// Backed-up dependency manifests.
    #[serde(default)]
    pub manifests: Vec<FileBackup>,
    /// Files the run creates; removed by cleanup.
    #[serde(default)]
    pub artifacts: Vec<Utf8PathBuf>,
    /// Run metadata.
    pub metadata: CheckpointMetadata,
}

impl Checkpoint {
    /// Every backup, files then manifests.
    pub fn backups(&self) -> impl Iterator<Item = &FileBackup> {
        self.files.iter().chain(&self.manifests)
    }

    /// Backup for `path`, if any.
    #[must_use]
    pub fn backup_for(&self, path: &Utf8Path) -> Option<&FileBackup> {
        self.backups().find(|b| b.path == path)
    }

    /// Returns `true` if writing `path` is covered: either backed up or
    /// recorded as an artifact.
    #[must_use]
    pub fn covers(&self, path: &Utf8Path) -> bool {
        self.backup_for(path).is_some() || self.artifacts.iter().any(|a| a == path)
    }

    /// Listing view without file contents.
    #[must_use]
    pub fn summary(&self) -> CheckpointSummary {
        CheckpointSummary {
            id: self.id,
            timestamp: self.timestamp,
            description: self.description.clone(),
            state: self.state,
            file_count: self.metadata.file_count,
            total_size: self.metadata.total_size,
            artifacts: self.artifacts.len(),
        }
    }
}

/// A checkpoint without its file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointSummary {
    /// Unique id.
    pub id: Uuid,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Human-readable purpose.
    pub description: String,
    /// Lifecycle state.
    pub state: CheckpointState,
    /// Files backed up.
    pub file_count: usize,
    /// Total bytes backed up.
    pub total_size: u64,
    /// Files the run creates.
    pub artifacts: usize,
}

/// A file that could not be restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreFailure {
    /// Root-relative path.
    pub path: Utf8PathBuf,
    /// What went wrong.
    pub reason: String,
}

/// Outcome of a rollback. Failures never stop the remaining restores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackResult {
    /// Files whose original content was written back.
    pub restored: Vec<Utf8PathBuf>,
    /// Files that could not be restored or did not verify.
    pub failed: Vec<RestoreFailure>,
    /// Restored files whose checksum was read back and matched.
    pub verified: Vec<Utf8PathBuf>,
}

impl RollbackResult {
    /// Returns `true` if every file was restored and verified.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.restored.len() == self.verified.len()
    }
}

/// Outcome of removing a rolled-back run's artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupResult {
    /// Artifacts deleted.
    pub removed: Vec<Utf8PathBuf>,
    /// Artifacts that could not be deleted.
    pub failed: Vec<RestoreFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CheckpointState; 4] = [
        CheckpointState::Created,
        CheckpointState::Committed,
        CheckpointState::RolledBack,
        CheckpointState::Deleted,
    ];

    #[test]
    fn test_valid_transitions() {
        let valid: Vec<(CheckpointState, CheckpointState)> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();
        assert_eq!(
            valid,
            vec![
                (CheckpointState::Created, CheckpointState::Committed),
                (CheckpointState::Created, CheckpointState::RolledBack),
                (CheckpointState::Committed, CheckpointState::Deleted),
                (CheckpointState::RolledBack, CheckpointState::Deleted),
            ]
        );
    }

    #[test]
    fn test_state_serializes_kebab_case() {
        let json = serde_json::to_string(&CheckpointState::RolledBack).expect("serialize");
        assert_eq!(json, "\"rolled-back\"");
    }

    #[test]
    fn test_covers_backups_and_artifacts() {
        let checkpoint = Checkpoint {
            id: Uuid::nil(),
            timestamp: Utc::now(),
            description: "test".to_owned(),
            state: CheckpointState::Created,
            files: vec![FileBackup {
                path: "tests/home.spec.js".into(),
                content: String::new(),
                checksum: sm_core::sha256_hex(b""),
                size: 0,
                timestamp: Utc::now(),
            }],
            manifests: Vec::new(),
            artifacts: vec![".smartui.json".into()],
            metadata: CheckpointMetadata::default(),
        };
        assert!(checkpoint.covers(Utf8Path::new("tests/home.spec.js")));
        assert!(checkpoint.covers(Utf8Path::new(".smartui.json")));
        assert!(!checkpoint.covers(Utf8Path::new("package.json")));
    }

    #[test]
    fn test_rollback_result_completeness() {
        let mut result = RollbackResult {
            restored: vec!["a.js".into()],
            failed: Vec::new(),
            verified: vec!["a.js".into()],
        };
        assert!(result.is_complete());
        result.failed.push(RestoreFailure {
            path: "b.js".into(),
            reason: "permission denied".to_owned(),
        });
        assert!(!result.is_complete());
    }
}
