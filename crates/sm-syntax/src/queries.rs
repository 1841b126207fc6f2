//! Pre-compiled tree-sitter queries locating calls and module references.
//!
//! Each [`SourceLanguage`] has one query with up to three captures:
//!
//! - `call` - a call or object-construction node
//! - `import` - an import statement or declaration
//! - `require` - a CommonJS `require('...')` call (JavaScript family only)
//!
//! Queries are compiled once per language and cached for the process
//! lifetime; [`SiteQuery`] also caches the capture indices so match loops
//! never compare capture names.

use std::sync::OnceLock;

use tree_sitter::{Language, Query};

use crate::error::ParseError;
use crate::language::{Family, SourceLanguage};

/// Query for JavaScript, TypeScript and TSX.
///
/// `require` calls match both `@call` and `@require`; the engine treats
/// them as module references only.
pub const JAVASCRIPT_QUERY: &str = r#"
(call_expression) @call
(new_expression) @call
(import_statement) @import

(call_expression
  function: (identifier) @_fn
  arguments: (arguments . (string) .)
  (#eq? @_fn "require")) @require
"#;

/// Query for Python. Only `from X import ...` references a module by a
/// name the engine rewrites.
pub const PYTHON_QUERY: &str = r"
(call) @call
(import_from_statement) @import
";

/// Query for Java.
pub const JAVA_QUERY: &str = r"
(method_invocation) @call
(object_creation_expression) @call
(import_declaration) @import
";

/// A compiled query with resolved capture indices.
#[derive(Debug)]
pub struct SiteQuery {
    /// The compiled query.
    pub query: Query,
    /// Index of the `call` capture.
    pub call: Option<u32>,
    /// Index of the `import` capture.
    pub import: Option<u32>,
    /// Index of the `require` capture.
    pub require: Option<u32>,
}

static COMPILED: [OnceLock<SiteQuery>; 5] = [const { OnceLock::new() }; 5];

/// Returns the query source for a grammar family.
#[must_use]
pub const fn query_source(family: Family) -> &'static str {
    match family {
        Family::JavaScript => JAVASCRIPT_QUERY,
        Family::Python => PYTHON_QUERY,
        Family::Java => JAVA_QUERY,
    }
}

/// Returns the compiled query for `language`.
///
/// The query is compiled once and cached for all subsequent calls.
/// This function is thread-safe.
///
/// # Errors
///
/// Returns [`ParseError::QueryCompile`] if the query fails to compile.
pub fn site_query(language: SourceLanguage) -> Result<&'static SiteQuery, ParseError> {
    let slot = &COMPILED[language.index()];
    if let Some(query) = slot.get() {
        return Ok(query);
    }

    let compiled = compile(&language.grammar(), query_source(language.family()))?;
    Ok(slot.get_or_init(|| compiled))
}

fn compile(language: &Language, source: &str) -> Result<SiteQuery, ParseError> {
    let query = Query::new(language, source).map_err(|e| ParseError::QueryCompile {
        offset: e.offset,
        kind: e.kind,
    })?;
    Ok(SiteQuery {
        call: query.capture_index_for_name("call"),
        import: query.capture_index_for_name("import"),
        require: query.capture_index_for_name("require"),
        query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_compiles() {
        for language in SourceLanguage::ALL {
            let query = site_query(language);
            assert!(query.is_ok(), "{language}: {query:?}");
        }
    }

    #[test]
    fn test_capture_indices() {
        let js = site_query(SourceLanguage::TypeScript).expect("query should compile");
        assert!(js.call.is_some());
        assert!(js.import.is_some());
        assert!(js.require.is_some());

        let py = site_query(SourceLanguage::Python).expect("query should compile");
        assert!(py.call.is_some());
        assert!(py.require.is_none());
    }

    #[test]
    fn test_query_is_cached() {
        let first = site_query(SourceLanguage::Java).expect("query should compile");
        let second = site_query(SourceLanguage::Java).expect("query should compile");
        assert!(std::ptr::eq(first, second));
    }
}
