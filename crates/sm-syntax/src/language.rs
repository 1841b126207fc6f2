//! Source languages and the grammar family each belongs to.
//!
//! [`SourceLanguage`] is a closed set; each variant knows its tree-sitter
//! grammar and its [`Family`]. Families share node shapes (TypeScript and
//! TSX parse calls and imports the same way JavaScript does), so lowering
//! and printing dispatch on the family.

use std::fmt;

use camino::Utf8Path;
use tree_sitter::Language;

/// A parseable source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    /// `.js`, `.jsx`, `.mjs`, `.cjs`
    JavaScript,
    /// `.ts`, `.mts`, `.cts`
    TypeScript,
    /// `.tsx`
    Tsx,
    /// `.py`
    Python,
    /// `.java`
    Java,
}

impl SourceLanguage {
    /// Every variant.
    pub const ALL: [Self; 5] = [
        Self::JavaScript,
        Self::TypeScript,
        Self::Tsx,
        Self::Python,
        Self::Java,
    ];

    /// Selects a language from a file extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use sm_syntax::SourceLanguage;
    ///
    /// assert_eq!(SourceLanguage::from_extension("tsx"), Some(SourceLanguage::Tsx));
    /// assert_eq!(SourceLanguage::from_extension("cjs"), Some(SourceLanguage::JavaScript));
    /// assert_eq!(SourceLanguage::from_extension("rb"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "py" => Some(Self::Python),
            "java" => Some(Self::Java),
            _ => None,
        }
    }

    /// Selects a language from a path's extension.
    #[must_use]
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        path.extension().and_then(Self::from_extension)
    }

    /// The tree-sitter grammar.
    #[must_use]
    pub fn grammar(self) -> Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::Java => tree_sitter_java::LANGUAGE.into(),
        }
    }

    /// The grammar family.
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::JavaScript | Self::TypeScript | Self::Tsx => Family::JavaScript,
            Self::Python => Family::Python,
            Self::Java => Family::Java,
        }
    }

    /// The dependency ecosystem this language belongs to.
    #[must_use]
    pub const fn ecosystem(self) -> sm_core::Language {
        match self.family() {
            Family::JavaScript => sm_core::Language::JavaScript,
            Family::Python => sm_core::Language::Python,
            Family::Java => sm_core::Language::Java,
        }
    }

    /// Index into per-language caches.
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::JavaScript => 0,
            Self::TypeScript => 1,
            Self::Tsx => 2,
            Self::Python => 3,
            Self::Java => 4,
        }
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Python => "python",
            Self::Java => "java",
        })
    }
}

/// Languages sharing node shapes for calls, imports and statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// JavaScript, TypeScript and TSX.
    JavaScript,
    /// Python.
    Python,
    /// Java.
    Java,
}

impl Family {
    /// Expression kinds that pass ownership of a call up to its statement.
    pub(crate) const fn wrapper_kinds(self) -> &'static [&'static str] {
        match self {
            Self::JavaScript => &[
                "await_expression",
                "parenthesized_expression",
                "non_null_expression",
                "variable_declarator",
                "assignment_expression",
            ],
            Self::Python => &["await", "parenthesized_expression", "assignment"],
            Self::Java => &[
                "parenthesized_expression",
                "variable_declarator",
                "assignment_expression",
            ],
        }
    }

    /// Statement kinds that can be deleted together with the call they own.
    pub(crate) const fn owning_statement_kinds(self) -> &'static [&'static str] {
        match self {
            Self::JavaScript => &[
                "expression_statement",
                "lexical_declaration",
                "variable_declaration",
            ],
            Self::Python => &["expression_statement"],
            Self::Java => &[
                "expression_statement",
                "local_variable_declaration",
                "field_declaration",
            ],
        }
    }

    /// Declaration kinds whose declarator count must be one to be owned.
    pub(crate) const fn declaration_kinds(self) -> &'static [&'static str] {
        match self {
            Self::JavaScript => &["lexical_declaration", "variable_declaration"],
            Self::Python => &[],
            Self::Java => &["local_variable_declaration", "field_declaration"],
        }
    }

    /// Nodes whose direct children are statements.
    pub(crate) const fn block_kinds(self) -> &'static [&'static str] {
        match self {
            Self::JavaScript => &["program", "statement_block", "switch_case", "switch_default"],
            Self::Python => &["module", "block"],
            Self::Java => &[
                "program",
                "block",
                "class_body",
                "constructor_body",
                "switch_block_statement_group",
            ],
        }
    }

    /// Nodes a statement search must not cross.
    pub(crate) const fn boundary_kinds(self) -> &'static [&'static str] {
        match self {
            Self::JavaScript => &[
                "arrow_function",
                "function_expression",
                "function",
                "generator_function",
                "formal_parameters",
                "class_body",
            ],
            Self::Python => &["lambda", "parameters", "decorator"],
            Self::Java => &["lambda_expression", "formal_parameters", "annotation"],
        }
    }

    /// Whether `kind` is a statement-level node in this family.
    pub(crate) fn is_statement(self, kind: &str) -> bool {
        kind.ends_with("_statement")
            || self.declaration_kinds().contains(&kind)
            || self.owning_statement_kinds().contains(&kind)
    }

    /// Line comment prefix.
    pub(crate) const fn comment_prefix(self) -> &'static str {
        match self {
            Self::JavaScript | Self::Java => "//",
            Self::Python => "#",
        }
    }
}
