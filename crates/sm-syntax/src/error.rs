//! Error types for the sm-syntax crate.
//!
//! [`ParseError`] never escapes [`Transformer::transform`](crate::Transformer::transform):
//! the engine converts it into a warning and returns the input unchanged. It
//! is public for callers that drive [`SyntaxParser`](crate::SyntaxParser)
//! directly.

use crate::language::SourceLanguage;

/// Errors that can occur while parsing a source file.
///
/// # Examples
///
/// ```
/// use sm_syntax::{ParseError, SourceLanguage};
///
/// let err = ParseError::Syntax { line: 3 };
/// assert_eq!(err.to_string(), "syntax error near line 3");
///
/// let err = ParseError::LanguageInit(SourceLanguage::Python);
/// assert!(err.to_string().contains("python"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The grammar could not be loaded into the parser.
    #[error("failed to set {0} language")]
    LanguageInit(SourceLanguage),

    /// Failed to compile a tree-sitter query.
    #[error("failed to compile query at offset {offset}: {kind:?}")]
    QueryCompile {
        /// The byte offset in the query string where the error occurred.
        offset: usize,
        /// The kind of query error.
        kind: tree_sitter::QueryErrorKind,
    },

    /// The parser produced no tree (cancelled or out of memory).
    #[error("failed to parse source code")]
    Parse,

    /// The tree contains error or missing nodes.
    #[error("syntax error near line {line}")]
    Syntax {
        /// 1-indexed line of the first error node.
        line: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display() {
        assert_eq!(ParseError::Parse.to_string(), "failed to parse source code");
    }

    #[test]
    fn test_language_init_display() {
        let err = ParseError::LanguageInit(SourceLanguage::Tsx);
        assert_eq!(err.to_string(), "failed to set tsx language");
    }
}
