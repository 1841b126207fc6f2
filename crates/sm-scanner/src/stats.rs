//! Analysis statistics.
//!
//! [`AnalysisStats`] is filled in by the analyzer's reducer, which is the
//! only writer, so plain counters suffice.
//!
//! # Examples
//!
//! ```
//! use sm_scanner::AnalysisStats;
//!
//! let mut stats = AnalysisStats::default();
//! stats.files_scanned = 4;
//! stats.files_with_changes = 3;
//! assert!((stats.change_percent() - 75.0).abs() < f64::EPSILON);
//! ```

use serde::{Deserialize, Serialize};

/// Point-in-time statistics for one analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Files read and examined (source, CI and manifests).
    pub files_scanned: u64,
    /// Files that would be modified.
    pub files_with_changes: u64,
    /// Source files left unchanged because they did not parse.
    pub parse_failures: u64,
    /// Session lifecycle calls that would be removed.
    pub removed_calls: u64,
}

impl AnalysisStats {
    /// Percentage of scanned files that would change.
    ///
    /// Returns 0.0 if nothing was scanned.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Acceptable for display purposes
    pub fn change_percent(&self) -> f64 {
        if self.files_scanned == 0 {
            return 0.0;
        }
        (self.files_with_changes as f64 / self.files_scanned as f64) * 100.0
    }

    /// Returns `true` if every scanned file parsed.
    #[inline]
    #[must_use]
    pub const fn all_parsed(&self) -> bool {
        self.parse_failures == 0
    }
}
