//! Domain types for smartui-migrate.
//!
//! # Module Organization
//!
//! - [`platform`] - Platforms, frameworks, languages, confidence tiers
//! - [`detection`] - Detection results, evidence and candidates
//! - [`change`] - Proposed changes and per-file code edits
//! - [`warning`] - Fidelity-loss warnings and the append-only log
//!
//! All public types are re-exported at the crate root:
//!
//! ```
//! use sm_core::{DetectionResult, Platform, ProposedChange, WarningLog};
//! ```

pub mod change;
pub mod detection;
pub mod platform;
pub mod warning;

pub use change::{ChangeKind, CodeChange, CodeChangeKind, ProposedChange, TransformedFile};
pub use detection::{Candidate, DetectionResult, Evidence, EvidenceSource, ProjectFiles};
pub use platform::{Confidence, Framework, Language, Platform, TestType};
pub use warning::{TransformationWarning, WarningLog};
