//! Fidelity-loss warnings.
//!
//! Warnings are a first-class output of every run. They are collected into a
//! [`WarningLog`], which only ever grows.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// A construct was skipped or migrated with reduced fidelity.
///
/// # Examples
///
/// ```
/// use sm_core::TransformationWarning;
///
/// let warning = TransformationWarning::new("option 'widths' dropped")
///     .with_details("SmartUI widths are configured in .smartui.json")
///     .with_line(12);
/// assert_eq!(warning.line, Some(12));
/// assert!(warning.to_string().contains("widths"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationWarning {
    /// Short human-readable summary.
    pub message: String,
    /// Optional longer explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Project-relative file the warning belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Utf8PathBuf>,
    /// 1-indexed line, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl TransformationWarning {
    /// Creates a warning with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            file: None,
            line: None,
        }
    }

    /// Adds an explanation.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Sets the file.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<Utf8PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Sets the line.
    #[must_use]
    pub const fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for TransformationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{file}:{line}: ")?,
            (Some(file), None) => write!(f, "{file}: ")?,
            _ => {}
        }
        f.write_str(&self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

/// Append-only list of warnings owned by a run.
///
/// There is deliberately no way to remove entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarningLog {
    entries: Vec<TransformationWarning>,
}

impl WarningLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends one warning.
    pub fn push(&mut self, warning: TransformationWarning) {
        self.entries.push(warning);
    }

    /// Appends warnings, stamping any without a file with `file`.
    pub fn extend_for_file(
        &mut self,
        file: &Utf8Path,
        warnings: impl IntoIterator<Item = TransformationWarning>,
    ) {
        self.entries.extend(warnings.into_iter().map(|mut w| {
            if w.file.is_none() {
                w.file = Some(file.to_owned());
            }
            w
        }));
    }

    /// Number of warnings recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over warnings in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, TransformationWarning> {
        self.entries.iter()
    }

    /// Borrows the warnings as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[TransformationWarning] {
        &self.entries
    }

    /// Consumes the log.
    #[must_use]
    pub fn into_vec(self) -> Vec<TransformationWarning> {
        self.entries
    }
}

impl Extend<TransformationWarning> for WarningLog {
    fn extend<I: IntoIterator<Item = TransformationWarning>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<'a> IntoIterator for &'a WarningLog {
    type Item = &'a TransformationWarning;
    type IntoIter = std::slice::Iter<'a, TransformationWarning>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_location() {
        let warning = TransformationWarning::new("dropped")
            .with_file("tests/home.spec.js")
            .with_line(4);
        assert_eq!(warning.to_string(), "tests/home.spec.js:4: dropped");
    }

    #[test]
    fn test_log_accumulates_in_order() {
        let mut log = WarningLog::new();
        log.push(TransformationWarning::new("first"));
        log.extend_for_file(
            Utf8Path::new("a.py"),
            [
                TransformationWarning::new("second"),
                TransformationWarning::new("third").with_file("b.py"),
            ],
        );
        let messages: Vec<&str> = log.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(log.as_slice()[1].file.as_deref(), Some(Utf8Path::new("a.py")));
        assert_eq!(log.as_slice()[2].file.as_deref(), Some(Utf8Path::new("b.py")));
    }

    #[test]
    fn test_log_serializes_as_list() {
        let mut log = WarningLog::new();
        log.push(TransformationWarning::new("x"));
        let json = serde_json::to_string(&log).expect("serialize");
        assert_eq!(json, r#"[{"message":"x"}]"#);
    }
}
