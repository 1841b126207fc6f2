//! Proposed and applied changes.
//!
//! [`ProposedChange`] is what a dry run reports; [`CodeChange`] is one
//! discrete edit inside a [`TransformedFile`].

use std::fmt;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// The kind of a proposed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    /// A new file will be written.
    Create,
    /// An existing file will be rewritten.
    Modify,
    /// Informational only; surfaces a warning next to structural changes.
    Info,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "CREATE",
            Self::Modify => "MODIFY",
            Self::Info => "INFO",
        })
    }
}

/// One entry in a dry-run report. Purely descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedChange {
    /// Project-relative path the change concerns.
    pub path: Utf8PathBuf,
    /// What kind of change it is.
    pub kind: ChangeKind,
    /// Human-readable description.
    pub description: String,
}

impl ProposedChange {
    /// Creates a change.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, kind: ChangeKind, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            description: description.into(),
        }
    }
}

/// What a single code edit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeChangeKind {
    /// A module reference was pointed at the target package.
    Import,
    /// A call was renamed with its arguments kept.
    Rename,
    /// A call was rebuilt with its options restructured.
    OptionRemap,
    /// An unsupported concept was approximated.
    Emulation,
    /// A session-lifecycle statement was deleted.
    Removal,
}

/// A discrete edit recorded while transforming a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChange {
    /// Kind of edit.
    pub kind: CodeChangeKind,
    /// Source text that was replaced.
    pub original: String,
    /// Replacement text; empty for removals.
    pub replacement: String,
    /// 1-indexed line of the original construct.
    pub line: u32,
    /// Human-readable description.
    pub description: String,
}

/// The result of transforming one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformedFile {
    /// Project-relative path of the file.
    pub original_path: Utf8PathBuf,
    /// Migrated content.
    pub content: String,
    /// Edits made, in source order.
    pub changes: Vec<CodeChange>,
    /// Constructs migrated by rename, remap or emulation.
    pub snapshot_count: usize,
}

impl TransformedFile {
    /// Returns `true` if the content differs from the input.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Number of edits of the given kind.
    #[must_use]
    pub fn count(&self, kind: CodeChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kind_wire_format() {
        let change = ProposedChange::new(".smartui.json", ChangeKind::Create, "generate config");
        let json = serde_json::to_string(&change).expect("serialize");
        assert!(json.contains(r#""kind":"CREATE""#));
        assert_eq!(ChangeKind::Info.to_string(), "INFO");
    }

    #[test]
    fn test_transformed_file_counts() {
        let file = TransformedFile {
            original_path: "a.js".into(),
            content: String::new(),
            changes: vec![
                CodeChange {
                    kind: CodeChangeKind::Rename,
                    original: "percySnapshot".to_owned(),
                    replacement: "smartuiSnapshot".to_owned(),
                    line: 3,
                    description: "renamed".to_owned(),
                },
                CodeChange {
                    kind: CodeChangeKind::Removal,
                    original: "eyes.close();".to_owned(),
                    replacement: String::new(),
                    line: 9,
                    description: "removed".to_owned(),
                },
            ],
            snapshot_count: 1,
        };
        assert!(file.is_modified());
        assert_eq!(file.count(CodeChangeKind::Removal), 1);
        assert_eq!(file.count(CodeChangeKind::Emulation), 0);
    }
}
