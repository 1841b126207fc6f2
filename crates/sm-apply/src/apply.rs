//! Applying a migration to disk.
//!
//! # Design
//!
//! 1. The plan is the preview's created and modified paths, filtered through
//!    [`FileConfirmation`] when per-file confirmation is on
//! 2. With backups on, a checkpoint covering every planned path is persisted
//!    before the first write; a failure here stops the run with nothing
//!    written
//! 3. Writes run one at a time, each via a flushed temporary file and a
//!    rename; the cancellation token is checked before every write
//! 4. The first failure or a cancellation runs exactly one rollback for the
//!    checkpoint, followed by artifact cleanup when the restore verified
//! 5. A successful run leaves its checkpoint `created` so the user can still
//!    roll back

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sm_core::mapping::target::TARGET_CONFIG_FILE;
use sm_core::{
    ApplyConfig, ChangeKind, CheckpointConfig, Config, DetectionResult, FxHashSet, ScanConfig,
    WarningLog, fx_hash_set,
};
use sm_scanner::{AnalysisReport, DryRunAnalyzer, ManifestKind};
use sm_syntax::{SourceLanguage, Transformer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::checkpoint::{Checkpoint, CheckpointMetadata, CheckpointRequest, RollbackResult};
use crate::error::ApplyError;
use crate::store::{CheckpointManager, write_atomic};
use crate::transform::{
    CiTransformer, ConfigTransformer, ConfirmAll, DependencyRenamer, FileConfirmation,
    KeyedCiSubstitution, ManifestTransformer, SmartUiConfig,
};

/// Per-run switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOptions {
    /// Only analyze; write nothing.
    pub dry_run: bool,
    /// Take a checkpoint before writing.
    pub create_backup: bool,
    /// Ask [`FileConfirmation`] before each file.
    pub confirm_each_file: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self::from(&ApplyConfig::default())
    }
}

impl From<&ApplyConfig> for ApplyOptions {
    fn from(config: &ApplyConfig) -> Self {
        Self {
            dry_run: false,
            create_backup: config.create_backup,
            confirm_each_file: config.confirm_each_file,
        }
    }
}

/// What an apply run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Every planned write completed.
    pub success: bool,
    /// Files written that did not exist before.
    pub files_created: Vec<Utf8PathBuf>,
    /// Existing files rewritten.
    pub files_modified: Vec<Utf8PathBuf>,
    /// Files captured in the checkpoint.
    pub files_backed_up: Vec<Utf8PathBuf>,
    /// Planned files declined by confirmation or left unchanged.
    pub skipped: Vec<Utf8PathBuf>,
    /// Warnings from every transformer.
    pub warnings: WarningLog,
    /// The run's checkpoint, if one was taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<Uuid>,
    /// What stopped the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Restore performed after a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback: Option<RollbackResult>,
    /// The analysis, for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<AnalysisReport>,
}

impl ApplyOutcome {
    /// Every file written, creations first.
    pub fn written(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.files_created.iter().chain(&self.files_modified)
    }
}

/// How a planned path is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Config,
    Manifest,
    Ci,
    Source(SourceLanguage),
}

#[derive(Debug, Clone)]
struct PlannedWrite {
    path: Utf8PathBuf,
    kind: WriteKind,
    create: bool,
}

/// Builds an [`ApplyManager`] with custom collaborators.
pub struct ApplyManagerBuilder {
    scan: ScanConfig,
    checkpoint: CheckpointConfig,
    confirmation: Arc<dyn FileConfirmation>,
    config: Arc<dyn ConfigTransformer>,
    ci: Arc<dyn CiTransformer>,
    manifests: Arc<dyn ManifestTransformer>,
}

impl ApplyManagerBuilder {
    /// Sets the per-file confirmation.
    #[must_use]
    pub fn confirmation(mut self, confirmation: impl FileConfirmation + 'static) -> Self {
        self.confirmation = Arc::new(confirmation);
        self
    }

    /// Sets the SmartUI configuration generator.
    #[must_use]
    pub fn config_transformer(mut self, config: impl ConfigTransformer + 'static) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Sets the CI transformer.
    #[must_use]
    pub fn ci_transformer(mut self, ci: impl CiTransformer + 'static) -> Self {
        self.ci = Arc::new(ci);
        self
    }

    /// Sets the manifest transformer.
    #[must_use]
    pub fn manifest_transformer(mut self, manifests: impl ManifestTransformer + 'static) -> Self {
        self.manifests = Arc::new(manifests);
        self
    }

    /// Finishes the builder.
    #[must_use]
    pub fn build(self) -> ApplyManager {
        ApplyManager {
            scan: self.scan,
            checkpoint: self.checkpoint,
            confirmation: self.confirmation,
            config: self.config,
            ci: self.ci,
            manifests: self.manifests,
            rolled_back: Mutex::new(fx_hash_set()),
        }
    }
}

/// Executes migrations with checkpoint protection.
pub struct ApplyManager {
    scan: ScanConfig,
    checkpoint: CheckpointConfig,
    confirmation: Arc<dyn FileConfirmation>,
    config: Arc<dyn ConfigTransformer>,
    ci: Arc<dyn CiTransformer>,
    manifests: Arc<dyn ManifestTransformer>,
    /// Checkpoints already rolled back by this manager.
    rolled_back: Mutex<FxHashSet<Uuid>>,
}

impl std::fmt::Debug for ApplyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyManager")
            .field("scan", &self.scan)
            .field("checkpoint", &self.checkpoint)
            .finish_non_exhaustive()
    }
}

impl ApplyManager {
    /// Creates a manager with the built-in transformers.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::builder(config).build()
    }

    /// Starts a builder seeded from `config`.
    #[must_use]
    pub fn builder(config: &Config) -> ApplyManagerBuilder {
        ApplyManagerBuilder {
            scan: config.scan.clone(),
            checkpoint: config.checkpoint.clone(),
            confirmation: Arc::new(ConfirmAll),
            config: Arc::new(SmartUiConfig),
            ci: Arc::new(KeyedCiSubstitution),
            manifests: Arc::new(DependencyRenamer),
        }
    }

    /// The checkpoint store for `root`.
    #[must_use]
    pub fn checkpoints(&self, root: &Utf8Path) -> CheckpointManager {
        CheckpointManager::new(root, &self.checkpoint)
    }

    /// Applies the changes previewed in `report`.
    ///
    /// # Errors
    ///
    /// Errors are returned only when the run stopped before its first
    /// write. Failures during writing are reported in the outcome after
    /// rollback.
    pub fn execute_transformation(
        &self,
        detection: &DetectionResult,
        report: &AnalysisReport,
        options: ApplyOptions,
        cancel: &CancellationToken,
    ) -> Result<ApplyOutcome, ApplyError> {
        if options.dry_run {
            let preview = DryRunAnalyzer::new(&self.scan).analyze(detection)?;
            return Ok(ApplyOutcome {
                success: true,
                warnings: preview.warnings.clone(),
                preview: Some(preview),
                ..ApplyOutcome::default()
            });
        }

        let mut outcome = ApplyOutcome::default();
        let plan = self.plan(detection, report, options, &mut outcome);
        if plan.is_empty() {
            info!(root = %detection.root, "nothing to apply");
            outcome.success = true;
            return Ok(outcome);
        }

        let checkpoint = if options.create_backup {
            Some(self.protect(detection, &plan)?)
        } else {
            None
        };
        if let Some(checkpoint) = &checkpoint {
            outcome.checkpoint_id = Some(checkpoint.id);
            outcome.files_backed_up = checkpoint.backups().map(|b| b.path.clone()).collect();
        }

        let mut transformer = Transformer::new();
        for write in &plan {
            if cancel.is_cancelled() {
                warn!(path = %write.path, "apply cancelled");
                let reason = "cancelled before all files were written".to_owned();
                return Ok(self.fail(detection, checkpoint.as_ref(), outcome, reason));
            }
            let written = self.write_one(
                detection,
                checkpoint.as_ref(),
                &mut transformer,
                write,
                &mut outcome.warnings,
            );
            match written {
                Ok(true) if write.create => outcome.files_created.push(write.path.clone()),
                Ok(true) => outcome.files_modified.push(write.path.clone()),
                Ok(false) => outcome.skipped.push(write.path.clone()),
                Err(err) => {
                    error!(path = %write.path, error = %err, "write failed");
                    return Ok(self.fail(detection, checkpoint.as_ref(), outcome, err.to_string()));
                }
            }
        }

        outcome.success = true;
        info!(
            created = outcome.files_created.len(),
            modified = outcome.files_modified.len(),
            skipped = outcome.skipped.len(),
            warnings = outcome.warnings.len(),
            checkpoint = ?outcome.checkpoint_id,
            "migration applied"
        );
        Ok(outcome)
    }

    /// Orders and classifies the planned paths, dropping declined ones.
    fn plan(
        &self,
        detection: &DetectionResult,
        report: &AnalysisReport,
        options: ApplyOptions,
        outcome: &mut ApplyOutcome,
    ) -> Vec<PlannedWrite> {
        let mut plan = Vec::new();
        for path in report.planned_paths() {
            let create = report.files_to_create.contains(path);
            let kind = if create && path.as_str() == TARGET_CONFIG_FILE {
                WriteKind::Config
            } else if ManifestKind::from_path(path).is_some() {
                WriteKind::Manifest
            } else if detection.files.ci.contains(path) {
                WriteKind::Ci
            } else if let Some(language) = SourceLanguage::from_path(path) {
                WriteKind::Source(language)
            } else {
                warn!(path = %path, "no transformer for planned file");
                outcome.skipped.push(path.clone());
                continue;
            };

            if options.confirm_each_file {
                let wanted = if create { ChangeKind::Create } else { ChangeKind::Modify };
                let description = report
                    .changes
                    .iter()
                    .find(|c| c.kind == wanted && &c.path == path)
                    .map_or("", |c| c.description.as_str());
                if !self.confirmation.confirm(path, description) {
                    debug!(path = %path, "declined");
                    outcome.skipped.push(path.clone());
                    continue;
                }
            }
            plan.push(PlannedWrite {
                path: path.clone(),
                kind,
                create,
            });
        }
        plan
    }

    /// Persists the checkpoint and checks it covers every planned path.
    fn protect(&self, detection: &DetectionResult, plan: &[PlannedWrite]) -> Result<Checkpoint, ApplyError> {
        let store = self.checkpoints(&detection.root);
        let request = CheckpointRequest {
            description: format!("before migrating from {}", detection.platform),
            metadata: CheckpointMetadata::for_detection(detection),
            files: plan.iter().filter(|w| !w.create).map(|w| w.path.clone()).collect(),
            artifacts: plan.iter().filter(|w| w.create).map(|w| w.path.clone()).collect(),
        };
        let checkpoint = store.create_checkpoint(request)?;

        if let Some(missing) = plan.iter().find(|w| !checkpoint.covers(&w.path)) {
            if let Err(err) = store.delete_checkpoint(checkpoint.id) {
                warn!(id = %checkpoint.id, error = %err, "cannot discard incomplete checkpoint");
            }
            return Err(ApplyError::CheckpointIntegrity {
                path: missing.path.clone(),
            });
        }
        Ok(checkpoint)
    }

    /// Writes one planned file. Returns `false` when there was nothing to
    /// write.
    fn write_one(
        &self,
        detection: &DetectionResult,
        checkpoint: Option<&Checkpoint>,
        transformer: &mut Transformer,
        write: &PlannedWrite,
        warnings: &mut WarningLog,
    ) -> Result<bool, ApplyError> {
        let path = &write.path;
        let content = match write.kind {
            WriteKind::Config => {
                let mut sources = Vec::with_capacity(detection.files.config.len());
                for config in &detection.files.config {
                    sources.push((config.clone(), read(detection, checkpoint, config)?));
                }
                Some(self.config.generate(detection, &sources)?)
            }
            WriteKind::Manifest => {
                let text = read(detection, checkpoint, path)?;
                let edit = self.manifests.transform(detection, path, &text)?;
                warnings.extend_for_file(path, edit.warnings);
                (edit.content != text).then_some(edit.content)
            }
            WriteKind::Ci => {
                let text = read(detection, checkpoint, path)?;
                self.ci.transform(detection.platform, &text)
            }
            WriteKind::Source(language) => {
                let text = read(detection, checkpoint, path)?;
                let out = transformer.transform(language, &text, detection.platform, detection.framework);
                let modified = out.is_modified();
                warnings.extend_for_file(path, out.warnings);
                modified.then_some(out.content)
            }
        };

        let Some(content) = content else {
            debug!(path = %path, "unchanged");
            return Ok(false);
        };

        let target = detection.absolute(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ApplyError::Write {
                path: path.clone(),
                source,
            })?;
        }
        write_atomic(&target, content.as_bytes()).map_err(|source| ApplyError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path, bytes = content.len(), "written");
        Ok(true)
    }

    /// Records the failure and rolls back once.
    fn fail(
        &self,
        detection: &DetectionResult,
        checkpoint: Option<&Checkpoint>,
        mut outcome: ApplyOutcome,
        reason: String,
    ) -> ApplyOutcome {
        outcome.success = false;
        outcome.error = Some(reason);
        match checkpoint {
            Some(checkpoint) => outcome.rollback = self.rollback_once(&detection.root, checkpoint.id),
            None => warn!(
                written = outcome.files_created.len() + outcome.files_modified.len(),
                "no checkpoint; written files left in place"
            ),
        }
        outcome
    }

    /// Rolls back `id` unless this manager already has.
    ///
    /// The lock is held for the whole restore so a second failure cannot
    /// start another one.
    fn rollback_once(&self, root: &Utf8Path, id: Uuid) -> Option<RollbackResult> {
        let mut done = self.rolled_back.lock();
        if !done.insert(id) {
            debug!(id = %id, "rollback already performed");
            return None;
        }

        let store = self.checkpoints(root);
        let result = match store.rollback_to_checkpoint(id) {
            Ok(result) => result,
            Err(err) => {
                error!(id = %id, error = %err, "rollback failed");
                return None;
            }
        };
        if result.is_complete() {
            match store.cleanup_after_rollback(id) {
                Ok(cleanup) => info!(id = %id, removed = cleanup.removed.len(), "rolled back and cleaned up"),
                Err(err) => warn!(id = %id, error = %err, "cleanup after rollback failed"),
            }
        } else {
            warn!(id = %id, failed = result.failed.len(), "rollback incomplete; checkpoint kept");
        }
        Some(result)
    }
}

/// Current text of `path`, taken from the checkpoint when it holds a backup.
fn read(
    detection: &DetectionResult,
    checkpoint: Option<&Checkpoint>,
    path: &Utf8Path,
) -> Result<String, ApplyError> {
    if let Some(backup) = checkpoint.and_then(|c| c.backup_for(path)) {
        return Ok(backup.content.clone());
    }
    fs::read_to_string(detection.absolute(path)).map_err(|source| ApplyError::Read {
        path: path.to_owned(),
        source,
    })
}
