//! Core types, mapping tables, errors, and configuration for smartui-migrate.
//!
//! This crate provides the foundational pieces shared across the workspace:
//!
//! - Domain types ([`DetectionResult`], [`ProposedChange`], [`TransformationWarning`], ...)
//! - The static [`mapping`] tables from Percy, Applitools and Sauce Labs to SmartUI
//! - [`Config`] and its sections, loaded from `.smartui-migrate.json`
//! - [`ConfigError`]
//! - `FxHashMap`/`FxHashSet` aliases and the [`sha256_hex`] checksum

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod mapping;
pub mod types;

pub use config::{ApplyConfig, CheckpointConfig, Config, ScanConfig};
pub use error::ConfigError;
pub use hash::{FxHashMap, FxHashSet, fx_hash_map, fx_hash_set, sha256_hex};
pub use mapping::MAPPING_TABLE_VERSION;
pub use types::{
    Candidate, ChangeKind, CodeChange, CodeChangeKind, Confidence, DetectionResult, Evidence,
    EvidenceSource, Framework, Language, Platform, ProjectFiles, ProposedChange, TestType,
    TransformationWarning, TransformedFile, WarningLog,
};
