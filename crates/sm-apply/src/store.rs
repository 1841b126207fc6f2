//! The on-disk checkpoint store.
//!
//! Records live at `<project>/<store_dir>/checkpoints/<id>.json`, one JSON
//! document per checkpoint. Every record write goes to a temporary sibling,
//! is flushed with `sync_all` and then renamed into place, so a crash leaves
//! either the old record or the new one.

use std::fs;
use std::io::Write;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use chrono::Utc;
use rayon::prelude::*;
use sm_core::{CheckpointConfig, sha256_hex};
use sm_scanner::ManifestKind;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::checkpoint::{
    Checkpoint, CheckpointRequest, CheckpointState, CheckpointSummary, CleanupResult, FileBackup,
    RestoreFailure, RollbackResult,
};
use crate::error::CheckpointError;

/// Creates, restores and manages checkpoints for one project.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    root: Utf8PathBuf,
    records: Utf8PathBuf,
    max_checkpoints: usize,
}

impl CheckpointManager {
    /// Creates a manager for the project at `root`.
    #[must_use]
    pub fn new(root: &Utf8Path, config: &CheckpointConfig) -> Self {
        Self {
            root: root.to_owned(),
            records: root.join(&config.store_dir).join("checkpoints"),
            max_checkpoints: config.max_checkpoints,
        }
    }

    /// Project root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn record_path(&self, id: Uuid) -> Utf8PathBuf {
        self.records.join(format!("{id}.json"))
    }

    /// Backs up every requested file and persists the checkpoint.
    ///
    /// Files are read and checksummed in parallel. If any existing file
    /// cannot be read, nothing is persisted.
    pub fn create_checkpoint(&self, request: CheckpointRequest) -> Result<Checkpoint, CheckpointError> {
        for path in request.files.iter().chain(&request.artifacts) {
            check_relative(path)?;
        }

        let (existing, missing): (Vec<&Utf8PathBuf>, Vec<&Utf8PathBuf>) = request
            .files
            .iter()
            .partition(|p| self.root.join(p).exists());

        let backups: Vec<FileBackup> = existing
            .par_iter()
            .map(|path| self.backup(path))
            .collect::<Result<_, _>>()?;

        let (manifests, files): (Vec<FileBackup>, Vec<FileBackup>) = backups
            .into_iter()
            .partition(|b| ManifestKind::from_path(&b.path).is_some());

        let mut artifacts: Vec<Utf8PathBuf> = Vec::new();
        for path in missing.into_iter().chain(&request.artifacts) {
            if !artifacts.contains(path) {
                artifacts.push(path.clone());
            }
        }

        let mut metadata = request.metadata;
        metadata.file_count = files.len() + manifests.len();
        metadata.total_size = files.iter().chain(&manifests).map(|b| b.size).sum();

        let checkpoint = Checkpoint {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            description: request.description,
            state: CheckpointState::Created,
            files,
            manifests,
            artifacts,
            metadata,
        };

        self.persist(&checkpoint)?;
        info!(
            id = %checkpoint.id,
            files = checkpoint.metadata.file_count,
            bytes = checkpoint.metadata.total_size,
            artifacts = checkpoint.artifacts.len(),
            "checkpoint created"
        );

        if let Err(err) = self.prune() {
            warn!(error = %err, "checkpoint pruning failed");
        }
        Ok(checkpoint)
    }

    fn backup(&self, path: &Utf8Path) -> Result<FileBackup, CheckpointError> {
        let content = fs::read_to_string(self.root.join(path)).map_err(|source| CheckpointError::Backup {
            path: path.to_owned(),
            source,
        })?;
        Ok(FileBackup {
            path: path.to_owned(),
            checksum: sha256_hex(content.as_bytes()),
            size: content.len() as u64,
            content,
            timestamp: Utc::now(),
        })
    }

    /// Restores every backed-up file to its original content.
    ///
    /// A file that cannot be written or does not verify is recorded and the
    /// remaining files are still restored.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::InvalidTransition`] unless the checkpoint is
    /// `created`.
    pub fn rollback_to_checkpoint(&self, id: Uuid) -> Result<RollbackResult, CheckpointError> {
        let mut checkpoint = self.get_checkpoint(id)?;
        ensure_transition(&checkpoint, CheckpointState::RolledBack)?;

        let mut result = RollbackResult::default();
        for backup in checkpoint.backups() {
            match self.restore(backup) {
                Ok(verified) => {
                    result.restored.push(backup.path.clone());
                    if verified {
                        result.verified.push(backup.path.clone());
                    } else {
                        result.failed.push(RestoreFailure {
                            path: backup.path.clone(),
                            reason: "checksum mismatch after restore".to_owned(),
                        });
                    }
                }
                Err(err) => {
                    warn!(path = %backup.path, error = %err, "restore failed");
                    result.failed.push(RestoreFailure {
                        path: backup.path.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        checkpoint.state = CheckpointState::RolledBack;
        self.persist(&checkpoint)?;
        info!(
            id = %id,
            restored = result.restored.len(),
            failed = result.failed.len(),
            "rollback finished"
        );
        Ok(result)
    }

    /// Writes one backup back and reports whether it verifies.
    fn restore(&self, backup: &FileBackup) -> std::io::Result<bool> {
        let path = self.root.join(&backup.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&path, backup.content.as_bytes())?;
        let written = fs::read(&path)?;
        Ok(sha256_hex(&written) == backup.checksum)
    }

    /// Removes a rolled-back run's artifacts and deletes the checkpoint.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::InvalidTransition`] unless the checkpoint is
    /// `rolled-back`.
    pub fn cleanup_after_rollback(&self, id: Uuid) -> Result<CleanupResult, CheckpointError> {
        let checkpoint = self.get_checkpoint(id)?;
        if checkpoint.state != CheckpointState::RolledBack {
            return Err(CheckpointError::InvalidTransition {
                id,
                from: checkpoint.state,
                to: CheckpointState::Deleted,
            });
        }

        let mut result = CleanupResult::default();
        for artifact in &checkpoint.artifacts {
            match fs::remove_file(self.root.join(artifact)) {
                Ok(()) => result.removed.push(artifact.clone()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => result.failed.push(RestoreFailure {
                    path: artifact.clone(),
                    reason: err.to_string(),
                }),
            }
        }

        self.tombstone(checkpoint)?;
        Ok(result)
    }

    /// Marks a checkpoint's migration as stable.
    pub fn commit_checkpoint(&self, id: Uuid) -> Result<Checkpoint, CheckpointError> {
        let mut checkpoint = self.get_checkpoint(id)?;
        ensure_transition(&checkpoint, CheckpointState::Committed)?;
        checkpoint.state = CheckpointState::Committed;
        self.persist(&checkpoint)?;
        info!(id = %id, "checkpoint committed");
        Ok(checkpoint)
    }

    /// Every non-deleted checkpoint, newest first.
    pub fn list_checkpoints(&self) -> Result<Vec<CheckpointSummary>, CheckpointError> {
        let mut summaries: Vec<CheckpointSummary> = self
            .load_all()?
            .iter()
            .filter(|c| c.state != CheckpointState::Deleted)
            .map(Checkpoint::summary)
            .collect();
        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }

    /// Loads one checkpoint, tombstones included.
    pub fn get_checkpoint(&self, id: Uuid) -> Result<Checkpoint, CheckpointError> {
        let path = self.record_path(id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound(id));
            }
            Err(err) => return Err(CheckpointError::io(path, err)),
        };
        serde_json::from_str(&text).map_err(|source| CheckpointError::Record { path, source })
    }

    /// Deletes a checkpoint's content, keeping a tombstone so a later
    /// rollback fails instead of finding nothing.
    ///
    /// A `created` checkpoint is committed first.
    pub fn delete_checkpoint(&self, id: Uuid) -> Result<(), CheckpointError> {
        let mut checkpoint = self.get_checkpoint(id)?;
        if checkpoint.state == CheckpointState::Created {
            checkpoint.state = CheckpointState::Committed;
        }
        self.tombstone(checkpoint)
    }

    fn tombstone(&self, mut checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        ensure_transition(&checkpoint, CheckpointState::Deleted)?;
        checkpoint.state = CheckpointState::Deleted;
        checkpoint.files.clear();
        checkpoint.manifests.clear();
        self.persist(&checkpoint)?;
        info!(id = %checkpoint.id, "checkpoint deleted");
        Ok(())
    }

    fn persist(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.records).map_err(|e| CheckpointError::io(&self.records, e))?;
        let path = self.record_path(checkpoint.id);
        let json = serde_json::to_vec_pretty(checkpoint).map_err(|source| CheckpointError::Record {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, &json).map_err(|e| CheckpointError::io(&path, e))?;
        debug!(id = %checkpoint.id, state = %checkpoint.state, "checkpoint persisted");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<Checkpoint>, CheckpointError> {
        let entries = match fs::read_dir(&self.records) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(CheckpointError::io(&self.records, err)),
        };

        let mut checkpoints = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CheckpointError::io(&self.records, e))?;
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if path.extension() != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| serde_json::from_str::<Checkpoint>(&text).map_err(|e| e.to_string()));
            match parsed {
                Ok(checkpoint) => checkpoints.push(checkpoint),
                Err(err) => warn!(path = %path, error = %err, "skipping unreadable checkpoint record"),
            }
        }
        Ok(checkpoints)
    }

    /// Drops the oldest settled records beyond the configured count. Live
    /// and rolled-back checkpoints are kept.
    fn prune(&self) -> Result<(), CheckpointError> {
        let mut all = self.load_all()?;
        if all.len() <= self.max_checkpoints {
            return Ok(());
        }
        all.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        let mut excess = all.len() - self.max_checkpoints;
        for checkpoint in all
            .iter()
            .filter(|c| matches!(c.state, CheckpointState::Committed | CheckpointState::Deleted))
        {
            if excess == 0 {
                break;
            }
            let path = self.record_path(checkpoint.id);
            fs::remove_file(&path).map_err(|e| CheckpointError::io(&path, e))?;
            debug!(id = %checkpoint.id, "checkpoint pruned");
            excess -= 1;
        }
        Ok(())
    }
}

fn ensure_transition(checkpoint: &Checkpoint, to: CheckpointState) -> Result<(), CheckpointError> {
    if checkpoint.state.can_transition_to(to) {
        Ok(())
    } else {
        Err(CheckpointError::InvalidTransition {
            id: checkpoint.id,
            from: checkpoint.state,
            to,
        })
    }
}

fn check_relative(path: &Utf8Path) -> Result<(), CheckpointError> {
    let escapes = path
        .components()
        .any(|c| !matches!(c, Utf8Component::Normal(_) | Utf8Component::CurDir));
    if escapes || path.as_str().is_empty() {
        return Err(CheckpointError::InvalidPath(path.to_owned()));
    }
    Ok(())
}

/// Writes `bytes` to a temporary sibling, flushes it and renames it over
/// `path`.
pub(crate) fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path.file_name().unwrap_or("file");
    let temp = path.with_file_name(format!(".{file_name}.smartui-tmp"));
    {
        let mut file = fs::File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    if let Err(err) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointMetadata;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> (TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).expect("utf8 tempdir");
        for (path, content) in files {
            let path = root.join(path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("mkdir");
            }
            fs::write(path, content).expect("write");
        }
        (dir, root)
    }

    fn manager(root: &Utf8Path) -> CheckpointManager {
        CheckpointManager::new(root, &CheckpointConfig::default())
    }

    fn request(files: &[&str]) -> CheckpointRequest {
        CheckpointRequest {
            description: "migrate".to_owned(),
            metadata: CheckpointMetadata::default(),
            files: files.iter().map(Utf8PathBuf::from).collect(),
            artifacts: Vec::new(),
        }
    }

    #[test]
    fn test_rollback_restores_content_and_checksum() {
        let (_dir, root) = project(&[
            ("package.json", "{\"devDependencies\":{\"@percy/cli\":\"1\"}}\n"),
            ("tests/home.spec.js", "await percySnapshot(page, 'Home');\n"),
            ("tests/cart.spec.js", "await percySnapshot(page, 'Cart');\n"),
        ]);
        let files = ["package.json", "tests/home.spec.js", "tests/cart.spec.js"];
        let originals: Vec<String> = files
            .iter()
            .map(|f| fs::read_to_string(root.join(f)).expect("read"))
            .collect();

        let checkpoints = manager(&root);
        let checkpoint = checkpoints.create_checkpoint(request(&files)).expect("create");
        assert_eq!(checkpoint.files.len(), 2);
        assert_eq!(checkpoint.manifests.len(), 1);
        assert_eq!(checkpoint.metadata.file_count, 3);

        for file in &files {
            fs::write(root.join(file), "mutated").expect("mutate");
        }
        fs::remove_dir_all(root.join("tests")).expect("remove dir");

        let result = checkpoints.rollback_to_checkpoint(checkpoint.id).expect("rollback");
        assert!(result.is_complete());
        assert_eq!(result.restored.len(), 3);
        for (file, original) in files.iter().zip(&originals) {
            let restored = fs::read_to_string(root.join(file)).expect("read");
            assert_eq!(&restored, original);
            let backup = checkpoint.backup_for(Utf8Path::new(file)).expect("backup");
            assert_eq!(sha256_hex(restored.as_bytes()), backup.checksum);
        }
        assert_eq!(
            checkpoints.get_checkpoint(checkpoint.id).expect("get").state,
            CheckpointState::RolledBack
        );
    }

    #[test]
    fn test_missing_files_become_artifacts() {
        let (_dir, root) = project(&[("tests/home.spec.js", "x\n")]);
        let checkpoint = manager(&root)
            .create_checkpoint(request(&["tests/home.spec.js", ".smartui.json"]))
            .expect("create");
        assert_eq!(checkpoint.artifacts, vec![Utf8PathBuf::from(".smartui.json")]);
        assert!(checkpoint.covers(Utf8Path::new(".smartui.json")));
    }

    #[test]
    fn test_rejects_paths_outside_root() {
        let (_dir, root) = project(&[]);
        let err = manager(&root).create_checkpoint(request(&["../secret.txt"]));
        assert!(matches!(err, Err(CheckpointError::InvalidPath(_))));
        let err = manager(&root).create_checkpoint(request(&["/etc/passwd"]));
        assert!(matches!(err, Err(CheckpointError::InvalidPath(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_persists_nothing() {
        let (_dir, root) = project(&[("ok.js", "x\n")]);
        // A directory where a file is expected cannot be read as text
        fs::create_dir_all(root.join("dir.js")).expect("mkdir");
        let checkpoints = manager(&root);
        let err = checkpoints.create_checkpoint(request(&["ok.js", "dir.js"]));
        assert!(matches!(err, Err(CheckpointError::Backup { .. })));
        assert!(checkpoints.list_checkpoints().expect("list").is_empty());
    }

    #[test]
    fn test_lifecycle_and_tombstone() {
        let (_dir, root) = project(&[("a.js", "a\n")]);
        let checkpoints = manager(&root);
        let checkpoint = checkpoints.create_checkpoint(request(&["a.js"])).expect("create");

        checkpoints.commit_checkpoint(checkpoint.id).expect("commit");
        let err = checkpoints.rollback_to_checkpoint(checkpoint.id);
        assert!(matches!(err, Err(CheckpointError::InvalidTransition { .. })));

        checkpoints.delete_checkpoint(checkpoint.id).expect("delete");
        let tombstone = checkpoints.get_checkpoint(checkpoint.id).expect("get");
        assert_eq!(tombstone.state, CheckpointState::Deleted);
        assert!(tombstone.files.is_empty());
        assert!(checkpoints.list_checkpoints().expect("list").is_empty());

        let err = checkpoints.rollback_to_checkpoint(checkpoint.id);
        assert!(matches!(
            err,
            Err(CheckpointError::InvalidTransition {
                from: CheckpointState::Deleted,
                ..
            })
        ));
    }

    #[test]
    fn test_cleanup_removes_artifacts() {
        let (_dir, root) = project(&[("a.js", "a\n")]);
        let checkpoints = manager(&root);
        let checkpoint = checkpoints
            .create_checkpoint(request(&["a.js", ".smartui.json"]))
            .expect("create");
        fs::write(root.join(".smartui.json"), "{}").expect("write artifact");

        let err = checkpoints.cleanup_after_rollback(checkpoint.id);
        assert!(matches!(err, Err(CheckpointError::InvalidTransition { .. })));

        checkpoints.rollback_to_checkpoint(checkpoint.id).expect("rollback");
        let cleanup = checkpoints.cleanup_after_rollback(checkpoint.id).expect("cleanup");
        assert_eq!(cleanup.removed, vec![Utf8PathBuf::from(".smartui.json")]);
        assert!(!root.join(".smartui.json").exists());
        assert_eq!(
            checkpoints.get_checkpoint(checkpoint.id).expect("get").state,
            CheckpointState::Deleted
        );
    }

    #[test]
    fn test_list_newest_first_and_unknown_id() {
        let (_dir, root) = project(&[("a.js", "a\n")]);
        let checkpoints = manager(&root);
        let first = checkpoints.create_checkpoint(request(&["a.js"])).expect("create");
        let second = checkpoints.create_checkpoint(request(&["a.js"])).expect("create");

        let ids: Vec<Uuid> = checkpoints
            .list_checkpoints()
            .expect("list")
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.id) && ids.contains(&second.id));
        if first.timestamp != second.timestamp {
            assert_eq!(ids[0], second.id);
        }

        let err = checkpoints.get_checkpoint(Uuid::nil());
        assert!(matches!(err, Err(CheckpointError::NotFound(_))));
    }

    #[test]
    fn test_prune_keeps_live_checkpoints() {
        let (_dir, root) = project(&[("a.js", "a\n")]);
        let checkpoints = CheckpointManager::new(
            &root,
            &CheckpointConfig {
                max_checkpoints: 2,
                ..CheckpointConfig::default()
            },
        );
        let old = checkpoints.create_checkpoint(request(&["a.js"])).expect("create");
        checkpoints.commit_checkpoint(old.id).expect("commit");
        let live_a = checkpoints.create_checkpoint(request(&["a.js"])).expect("create");
        let live_b = checkpoints.create_checkpoint(request(&["a.js"])).expect("create");

        let ids: Vec<Uuid> = checkpoints
            .list_checkpoints()
            .expect("list")
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&live_a.id) && ids.contains(&live_b.id));
    }

    #[test]
    fn test_write_atomic_leaves_no_temp() {
        let (_dir, root) = project(&[]);
        let path = root.join("record.json");
        write_atomic(&path, b"{}").expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "{}");
        assert!(!root.join(".record.json.smartui-tmp").exists());
    }
}
