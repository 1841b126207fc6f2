//! Language-neutral view of the constructs the engine rewrites.
//!
//! Adapters in [`lower`](crate::lower) turn tree-sitter nodes into these
//! types; the planner in [`engine`](crate::engine) only ever sees the IR
//! plus byte ranges into the original text.

use std::ops::Range;

use smallvec::SmallVec;

/// An argument or option value with its original source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    /// Structural value.
    pub value: Value,
    /// Exact source text.
    pub text: String,
}

impl Expr {
    /// Creates an expression.
    pub fn new(value: Value, text: impl Into<String>) -> Self {
        Self {
            value,
            text: text.into(),
        }
    }

    /// Returns the unquoted contents if this is a plain string literal.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::Str { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// Returns `true` for a plain string literal.
    pub fn is_str(&self) -> bool {
        matches!(self.value, Value::Str { .. })
    }

    /// Returns `true` for an object, dictionary or map literal.
    pub fn is_object(&self) -> bool {
        matches!(self.value, Value::Object(_))
    }
}

/// The structural shape of an [`Expr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A string without interpolation.
    Str {
        /// Contents between the quotes, escapes untouched.
        inner: String,
        /// Opening quote character.
        quote: char,
    },
    /// A numeric literal.
    Number,
    /// A boolean literal.
    Bool(bool),
    /// `null`, `None` or `undefined`.
    Null,
    /// An array, list, tuple or `List.of(...)`.
    Array(Vec<Expr>),
    /// An object, dict or `Map.of(...)`; spreads use the key `...`.
    Object(Vec<(String, Expr)>),
    /// A call, possibly chained.
    Call(Box<CallExpr>),
    /// An identifier or member path.
    Ident,
    /// Anything else.
    Raw,
}

/// A call inside an expression, used for fluent chains and selector
/// helpers such as `By.css(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    /// The receiver, `None` for bare calls.
    pub receiver: Option<Expr>,
    /// Method or function name.
    pub name: String,
    /// Positional arguments.
    pub args: Vec<Expr>,
    /// Keyword arguments (Python).
    pub kwargs: Vec<(String, Expr)>,
}

/// Where a call sits in its statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementInfo {
    /// Byte range of the enclosing statement.
    pub span: Range<usize>,
    /// The call is the whole statement, up to awaits, parentheses and a
    /// single declarator or assignment.
    pub owned: bool,
    /// Name bound by the statement, if any.
    pub declared: Option<String>,
}

/// A call or construction found by the site query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Byte range of the call expression.
    pub span: Range<usize>,
    /// Byte range of the callee (receiver and name).
    pub callee: Range<usize>,
    /// Receiver source text.
    pub receiver: Option<String>,
    /// Called name or constructed class.
    pub name: String,
    /// `new X()` in JavaScript and Java.
    pub is_constructor: bool,
    /// Positional arguments.
    pub args: SmallVec<[Expr; 4]>,
    /// Keyword arguments (Python).
    pub kwargs: SmallVec<[(String, Expr); 2]>,
    /// 1-indexed line.
    pub line: u32,
    /// Enclosing statement, `None` if the call sits in an expression body.
    pub statement: Option<StatementInfo>,
}

impl CallSite {
    /// Source text of the whole call.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.span.clone()).unwrap_or_default()
    }
}

/// How a module reference is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStyle {
    /// `import { a } from 'm'` or `import a from 'm'`.
    Bound,
    /// `import 'm'`.
    SideEffect,
    /// `require('m')`; `keyword` is set when the require is the sole
    /// initializer of a declaration and `span` covers the declaration.
    Require {
        /// `const`, `let` or `var`.
        keyword: Option<String>,
    },
    /// `from m import a`.
    PythonFrom,
    /// `import m.A;`
    Java,
}

/// A name an import brings into scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Exported name; [`DEFAULT_EXPORT`] for default imports and whole-module
    /// requires, [`NAMESPACE`] for `* as x`.
    pub imported: String,
    /// Local name.
    pub local: String,
}

/// `imported` of a default import.
pub const DEFAULT_EXPORT: &str = "default";
/// `imported` of a namespace import.
pub const NAMESPACE: &str = "*";

impl ImportBinding {
    /// Creates a binding.
    pub fn new(imported: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            imported: imported.into(),
            local: local.into(),
        }
    }

    /// `import { a }` rather than `import { a as b }`.
    pub fn is_plain(&self) -> bool {
        self.imported == self.local
    }
}

/// A module reference found by the site query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    /// Byte range of the statement (or the require call).
    pub span: Range<usize>,
    /// Module as matched against the module table.
    pub module: String,
    /// Byte range of the module reference, quotes included.
    pub module_span: Range<usize>,
    /// Quote character of the module literal, `None` for bare names.
    pub quote: Option<char>,
    /// Form of the reference.
    pub style: ImportStyle,
    /// Names bound, in source order.
    pub bindings: Vec<ImportBinding>,
    /// Ends with `;`.
    pub terminated: bool,
    /// 1-indexed line.
    pub line: u32,
}

/// Everything the site query found in one file, in document order.
#[derive(Debug, Default)]
pub struct Sites {
    /// Calls and constructions.
    pub calls: Vec<CallSite>,
    /// Module references.
    pub imports: Vec<ImportSite>,
}
