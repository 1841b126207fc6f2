//! Checkpointed, reversible application of SmartUI migrations.
//!
//! # Overview
//!
//! - [`CheckpointManager`]: persists full-content backups under the project
//!   and restores them
//! - [`ApplyManager`]: writes a previewed migration, rolling back on failure
//!   or cancellation
//! - [`transform`]: seams for the configuration, CI and manifest rewriters
//!
//! # Example
//!
//! ```ignore
//! use sm_apply::{ApplyManager, ApplyOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let manager = ApplyManager::new(&config);
//! let outcome = manager.execute_transformation(
//!     &detection,
//!     &report,
//!     ApplyOptions::from(&config.apply),
//!     &CancellationToken::new(),
//! )?;
//! if !outcome.success {
//!     eprintln!("rolled back: {:?}", outcome.rollback);
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod apply;
pub mod checkpoint;
pub mod error;
mod store;
pub mod transform;

pub use apply::{ApplyManager, ApplyManagerBuilder, ApplyOptions, ApplyOutcome};
pub use checkpoint::{
    Checkpoint, CheckpointMetadata, CheckpointRequest, CheckpointState, CheckpointSummary,
    CleanupResult, FileBackup, RestoreFailure, RollbackResult,
};
pub use error::{ApplyError, CheckpointError};
pub use store::CheckpointManager;
pub use transform::{
    CiTransformer, ConfigTransformer, ConfirmAll, FileConfirmation, ManifestEdit,
    ManifestTransformer,
};
