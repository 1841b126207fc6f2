//! Error types for the sm-scanner crate.
//!
//! [`ScanError`] covers traversal, file reads and manifest parsing.
//! [`DetectError`] is what [`Detector`](crate::Detector) returns: the two
//! detection outcomes that end a run, plus any fatal scan error.

use camino::Utf8PathBuf;
use sm_core::Candidate;

/// Errors that can occur during scanning operations.
///
/// # Error Recovery Strategy
///
/// - **Walker errors** ([`ScanError::Walk`]): Fatal - propagate immediately
/// - **File read errors** ([`ScanError::Read`]): Log warning, skip file, continue scan
/// - **Manifest errors** ([`ScanError::Manifest`]): Log warning, skip manifest, continue
///
/// # Examples
///
/// ```
/// use sm_scanner::ScanError;
///
/// fn handle_error(err: &ScanError) {
///     match err {
///         ScanError::Walk(e) => eprintln!("Walk error: {e}"),
///         ScanError::Read { path, .. } => eprintln!("Read error: {path}"),
///         ScanError::Manifest { path, .. } => eprintln!("Bad manifest: {path}"),
///         ScanError::Glob(e) => eprintln!("Bad pattern: {e}"),
///         ScanError::Config(msg) => eprintln!("Config error: {msg}"),
///         ScanError::NonUtf8Path(p) => eprintln!("Invalid path: {}", p.display()),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to read a file.
    ///
    /// Scanning can continue by skipping this file.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A dependency manifest could not be parsed.
    #[error("failed to parse manifest {path}: {reason}")]
    Manifest {
        /// The manifest path.
        path: Utf8PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A file pattern failed to compile.
    #[error("invalid file pattern: {0}")]
    Glob(#[from] globset::Error),

    /// Invalid scanner configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

impl ScanError {
    /// Creates a new [`ScanError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Manifest`] error.
    #[inline]
    pub fn manifest(path: impl Into<Utf8PathBuf>, reason: impl ToString) -> Self {
        Self::Manifest {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new [`ScanError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if this error is recoverable (scanning can continue).
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Manifest { .. })
    }

    /// Returns `true` if this error is fatal (scanning should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } | Self::Manifest { path, .. } => Some(path),
            Self::Walk(_) | Self::Glob(_) | Self::Config(_) | Self::NonUtf8Path(_) => None,
        }
    }
}

/// Errors that end detection.
///
/// Every variant is fatal to the run: nothing downstream of detection
/// executes after one of these.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// No manifest dependency and no configuration file evidenced a platform.
    #[error("no visual testing platform detected in {root}")]
    PlatformNotDetected {
        /// Project root that was scanned.
        root: Utf8PathBuf,
    },

    /// More than one platform was evidenced within the same tier.
    #[error("multiple platforms detected: {}", platform_list(candidates))]
    MultiplePlatformsDetected {
        /// Every evidenced candidate, strongest first.
        candidates: Vec<Candidate>,
    },

    /// Scanning the project failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl DetectError {
    /// Returns `true` if the run can be retried after the user picks a
    /// candidate.
    #[must_use]
    pub const fn needs_choice(&self) -> bool {
        matches!(self, Self::MultiplePlatformsDetected { .. })
    }

    /// Candidates carried by an ambiguity error.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::MultiplePlatformsDetected { candidates } => candidates,
            Self::PlatformNotDetected { .. } | Self::Scan(_) => &[],
        }
    }
}

fn platform_list(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(|c| c.platform.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_core::{Confidence, Framework, Language, Platform};
    use std::io;

    #[test]
    fn test_scan_error_read() {
        let err = ScanError::read("tests/a.spec.js", io::Error::new(io::ErrorKind::NotFound, "not found"));
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
        assert_eq!(err.path().map(|p| p.as_str()), Some("tests/a.spec.js"));
        assert!(err.to_string().contains("tests/a.spec.js"));
    }

    #[test]
    fn test_scan_error_manifest() {
        let err = ScanError::manifest("package.json", "expected value at line 1 column 1");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("package.json"));
    }

    #[test]
    fn test_scan_error_config_is_fatal() {
        let err = ScanError::config("root path does not exist: /nope");
        assert!(err.is_fatal());
        assert!(err.path().is_none());
    }

    #[test]
    fn test_ambiguity_lists_platforms() {
        let candidate = |platform| Candidate {
            platform,
            framework: Framework::Cypress,
            language: Language::JavaScript,
            confidence: Confidence::High,
            evidence: Vec::new(),
        };
        let err = DetectError::MultiplePlatformsDetected {
            candidates: vec![candidate(Platform::Percy), candidate(Platform::Applitools)],
        };
        assert!(err.needs_choice());
        assert_eq!(err.candidates().len(), 2);
        assert_eq!(err.to_string(), "multiple platforms detected: Percy, Applitools");
    }

    #[test]
    fn test_not_detected_names_root() {
        let err = DetectError::PlatformNotDetected {
            root: "/work/app".into(),
        };
        assert!(!err.needs_choice());
        assert!(err.candidates().is_empty());
        assert!(err.to_string().contains("/work/app"));
    }
}
