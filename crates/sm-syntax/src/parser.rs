//! Parser management.
//!
//! [`SyntaxParser`] keeps one tree-sitter [`Parser`] per language, created
//! on first use and reused for every later file of that language.

use tree_sitter::{Node, Parser, Tree};

use crate::error::ParseError;
use crate::language::SourceLanguage;

/// A reusable multi-language parser.
///
/// # Thread Safety
///
/// `SyntaxParser` is `Send` but not `Sync`. For parallel work create one
/// per worker (for example with rayon's `map_init`). The compiled queries
/// are shared across all instances.
///
/// # Examples
///
/// ```
/// use sm_syntax::{SourceLanguage, SyntaxParser};
///
/// let mut parser = SyntaxParser::new();
/// let tree = parser.parse(SourceLanguage::Python, "percy_snapshot(driver, 'Home')\n")?;
/// assert_eq!(tree.root_node().kind(), "module");
/// # Ok::<(), sm_syntax::ParseError>(())
/// ```
#[derive(Default)]
pub struct SyntaxParser {
    parsers: [Option<Parser>; 5],
}

impl SyntaxParser {
    /// Creates a parser with no grammars loaded yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `source` and rejects trees containing syntax errors.
    ///
    /// # Errors
    ///
    /// - [`ParseError::LanguageInit`] if the grammar cannot be loaded
    /// - [`ParseError::Parse`] if tree-sitter returns no tree
    /// - [`ParseError::Syntax`] if the tree contains error or missing nodes
    pub fn parse(&mut self, language: SourceLanguage, source: &str) -> Result<Tree, ParseError> {
        let tree = self.parse_lenient(language, source)?;
        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root).map_or(1, line_of);
            return Err(ParseError::Syntax { line });
        }
        Ok(tree)
    }

    /// Parses `source`, returning the tree even if it contains errors.
    ///
    /// # Errors
    ///
    /// - [`ParseError::LanguageInit`] if the grammar cannot be loaded
    /// - [`ParseError::Parse`] if tree-sitter returns no tree
    pub fn parse_lenient(
        &mut self,
        language: SourceLanguage,
        source: &str,
    ) -> Result<Tree, ParseError> {
        let parser = self.parser_for(language)?;
        parser.parse(source, None).ok_or(ParseError::Parse)
    }

    fn parser_for(&mut self, language: SourceLanguage) -> Result<&mut Parser, ParseError> {
        let slot = &mut self.parsers[language.index()];
        if slot.is_none() {
            let mut parser = Parser::new();
            parser
                .set_language(&language.grammar())
                .map_err(|_| ParseError::LanguageInit(language))?;
            *slot = Some(parser);
        }
        slot.as_mut().ok_or(ParseError::LanguageInit(language))
    }
}

impl std::fmt::Debug for SyntaxParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loaded: Vec<SourceLanguage> = SourceLanguage::ALL
            .into_iter()
            .filter(|l| self.parsers[l.index()].is_some())
            .collect();
        f.debug_struct("SyntaxParser").field("loaded", &loaded).finish()
    }
}

/// 1-indexed line of a node's start.
pub(crate) fn line_of(node: Node<'_>) -> u32 {
    u32::try_from(node.start_position().row + 1).unwrap_or(u32::MAX)
}

/// First error or missing node in document order.
pub(crate) fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}
