//! Platform detection and read-only migration analysis.
//!
//! This crate finds out what a project is built with and what migrating it
//! to SmartUI would change, without writing anything.
//!
//! # Overview
//!
//! - [`Detector`]: resolves platform, framework and language from dependency
//!   manifests, falling back to platform configuration files
//! - [`FileWalker`]: directory traversal respecting `.gitignore` patterns
//! - [`FileClassifier`]: sorts walked paths into config, source, CI and
//!   manifest lists
//! - [`manifest`]: `package.json`, requirements, `pyproject.toml`, `pom.xml`
//!   and Gradle readers
//! - [`DryRunAnalyzer`]: parallel per-file analysis producing an
//!   [`AnalysisReport`]
//!
//! # Example
//!
//! ```ignore
//! use sm_core::Config;
//! use sm_scanner::{Detector, DryRunAnalyzer};
//!
//! let config = Config::load(root)?;
//! let detection = Detector::new(&config).detect(root)?;
//! let report = DryRunAnalyzer::new(&config.scan).analyze(&detection)?;
//!
//! for change in &report.changes {
//!     println!("{} {}: {}", change.kind, change.path, change.description);
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Detector
//!     ├── FileWalker (collect paths, ignore crate)
//!     ├── Manifest readers (tier 1)
//!     ├── config globs (tier 2)
//!     └── FileClassifier (globset)
//!
//! DryRunAnalyzer
//!     ├── rayon pool (one Transformer per worker)
//!     └── crossbeam channel -> reducer thread (ordered fold)
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod analyzer;
mod detector;
pub mod error;
mod files;
pub mod manifest;
mod stats;
mod walker;

pub use analyzer::{AnalysisReport, DryRunAnalyzer};
pub use detector::Detector;
pub use error::{DetectError, ScanError};
pub use files::FileClassifier;
pub use manifest::{Manifest, ManifestKind};
pub use stats::AnalysisStats;
pub use walker::{FileWalker, SKIP_DIRECTORIES};
