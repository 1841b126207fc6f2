//! Error types for the sm-apply crate.
//!
//! [`CheckpointError`] covers the checkpoint store. [`ApplyError`] is what
//! [`ApplyManager`](crate::ApplyManager) returns when a run stops before its
//! first write; failures after that are reported in the
//! [`ApplyOutcome`](crate::ApplyOutcome) together with the rollback result.

use camino::Utf8PathBuf;
use sm_scanner::ScanError;
use uuid::Uuid;

use crate::checkpoint::CheckpointState;

/// Errors raised by the checkpoint store.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// No record with this id exists.
    #[error("checkpoint {0} not found")]
    NotFound(Uuid),

    /// A planned file could not be backed up; nothing was persisted.
    #[error("cannot back up {path}: {source}")]
    Backup {
        /// Root-relative path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The requested lifecycle step is not allowed from the current state.
    #[error("checkpoint {id} cannot go from {from} to {to}")]
    InvalidTransition {
        /// Checkpoint id.
        id: Uuid,
        /// Current state.
        from: CheckpointState,
        /// Requested state.
        to: CheckpointState,
    },

    /// A path escapes the project root.
    #[error("path is not inside the project: {0}")]
    InvalidPath(Utf8PathBuf),

    /// Reading or writing the store failed.
    #[error("checkpoint store I/O failed at {path}: {source}")]
    Io {
        /// Path involved.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded or decoded.
    #[error("invalid checkpoint record {path}: {source}")]
    Record {
        /// Record path.
        path: Utf8PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl CheckpointError {
    /// Creates a new [`CheckpointError::Io`] error.
    #[inline]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors that mean the request itself was invalid,
    /// as opposed to a storage failure.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::InvalidTransition { .. } | Self::InvalidPath(_)
        )
    }
}

/// Errors raised while applying a migration.
///
/// Returned directly only when the run stops before its first write.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// Creating or reading the checkpoint failed.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// A file about to be written has no backup in the run's checkpoint.
    #[error("checkpoint has no backup for {path}")]
    CheckpointIntegrity {
        /// Root-relative path.
        path: Utf8PathBuf,
    },

    /// The dry run failed to start.
    #[error(transparent)]
    Analysis(#[from] ScanError),

    /// A file needed to compute new content could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Root-relative path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing a migrated file failed.
    #[error("cannot write {path}: {source}")]
    Write {
        /// Root-relative path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A structured transformer rejected its input.
    #[error("cannot transform {path}: {reason}")]
    Transform {
        /// Root-relative path.
        path: Utf8PathBuf,
        /// Transformer message.
        reason: String,
    },
}

impl ApplyError {
    /// Creates a new [`ApplyError::Transform`] error.
    #[inline]
    pub fn transform(path: impl Into<Utf8PathBuf>, reason: impl ToString) -> Self {
        Self::Transform {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` if the checkpoint was missing or incomplete.
    #[must_use]
    pub const fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Self::CheckpointIntegrity { .. } | Self::Checkpoint(CheckpointError::Backup { .. })
        )
    }
}
