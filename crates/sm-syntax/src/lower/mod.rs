//! Lowering from tree-sitter nodes to the neutral IR.
//!
//! [`collect_sites`] runs the language's site query and hands each captured
//! node to the family adapter. The adapters only describe node shapes; the
//! statement walk and capture bookkeeping are shared here.

mod java;
mod javascript;
mod python;

use smallvec::SmallVec;
use sm_core::{FxHashSet, fx_hash_set};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};

use crate::error::ParseError;
use crate::ir::{CallSite, Expr, Sites, StatementInfo};
use crate::language::{Family, SourceLanguage};
use crate::parser::line_of;
use crate::queries::site_query;

/// Collects every call and module reference in document order.
///
/// # Errors
///
/// Returns [`ParseError::QueryCompile`] if the site query fails to compile.
pub(crate) fn collect_sites(
    language: SourceLanguage,
    tree: &Tree,
    source: &str,
) -> Result<Sites, ParseError> {
    let family = language.family();
    let site = site_query(language)?;

    let mut call_nodes: Vec<Node<'_>> = Vec::new();
    let mut import_nodes: Vec<Node<'_>> = Vec::new();
    let mut requires: FxHashSet<usize> = fx_hash_set();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&site.query, tree.root_node(), source.as_bytes());
    while let Some(m) = matches.next() {
        for capture in m.captures {
            let index = Some(capture.index);
            if index == site.require {
                requires.insert(capture.node.id());
                import_nodes.push(capture.node);
            } else if index == site.call {
                call_nodes.push(capture.node);
            } else if index == site.import {
                import_nodes.push(capture.node);
            }
        }
    }

    let mut sites = Sites::default();
    for node in call_nodes {
        if requires.contains(&node.id()) {
            continue;
        }
        let lowered = match family {
            Family::JavaScript => javascript::lower_call(node, source),
            Family::Python => python::lower_call(node, source),
            Family::Java => java::lower_call(node, source),
        };
        if let Some(parts) = lowered {
            sites.calls.push(parts.into_site(node, family, source));
        }
    }
    for node in import_nodes {
        let lowered = match family {
            Family::JavaScript if requires.contains(&node.id()) => {
                javascript::lower_require(node, source)
            }
            Family::JavaScript => javascript::lower_import(node, source),
            Family::Python => python::lower_import(node, source),
            Family::Java => java::lower_import(node, source),
        };
        sites.imports.extend(lowered);
    }

    sites.calls.sort_by_key(|c| c.span.start);
    sites.imports.sort_by_key(|i| i.span.start);
    Ok(sites)
}

/// Node kinds whose text names a binding or a path through one.
const REFERENCE_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "member_expression",
    "attribute",
    "field_access",
];

/// Every identifier and member path written in `tree`, comments and
/// strings excluded.
pub(crate) fn references(tree: &Tree, source: &str) -> FxHashSet<String> {
    let mut found = fx_hash_set();
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        if REFERENCE_KINDS.contains(&node.kind()) {
            found.insert(text(node, source).to_owned());
        }
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return found;
            }
        }
    }
}

/// Call fields produced by an adapter.
pub(crate) struct CallParts {
    pub callee: std::ops::Range<usize>,
    pub receiver: Option<String>,
    pub name: String,
    pub is_constructor: bool,
    pub args: SmallVec<[Expr; 4]>,
    pub kwargs: SmallVec<[(String, Expr); 2]>,
}

impl CallParts {
    fn into_site(self, node: Node<'_>, family: Family, source: &str) -> CallSite {
        CallSite {
            span: node.byte_range(),
            callee: self.callee,
            receiver: self.receiver,
            name: self.name,
            is_constructor: self.is_constructor,
            args: self.args,
            kwargs: self.kwargs,
            line: line_of(node),
            statement: statement_info(family, node, source),
        }
    }
}

/// Finds the statement enclosing `call` and whether the call owns it.
///
/// The walk crosses any expression, but ownership survives only wrapper
/// kinds. Boundary kinds (function bodies, lambdas) stop the walk: an
/// assertion cannot be inserted in front of an expression body.
fn statement_info(family: Family, call: Node<'_>, source: &str) -> Option<StatementInfo> {
    let mut owned = true;
    let mut declared = None;
    let mut node = call;
    loop {
        let parent = node.parent()?;
        let kind = parent.kind();
        if family.boundary_kinds().contains(&kind) {
            return None;
        }
        let in_block = parent
            .parent()
            .is_some_and(|p| family.block_kinds().contains(&p.kind()));
        if in_block && family.is_statement(kind) {
            let owned = owned
                && family.owning_statement_kinds().contains(&kind)
                && (!family.declaration_kinds().contains(&kind) || declarator_count(parent) == 1);
            return Some(StatementInfo {
                span: parent.byte_range(),
                owned,
                declared: if owned { declared } else { None },
            });
        }
        if family.wrapper_kinds().contains(&kind) {
            match bound_name(parent, node, source) {
                Binding::Name(name) => declared = Some(name),
                Binding::NotValue => owned = false,
                Binding::None => {}
            }
        } else {
            owned = false;
        }
        node = parent;
    }
}

enum Binding {
    Name(String),
    NotValue,
    None,
}

fn bound_name(parent: Node<'_>, child: Node<'_>, source: &str) -> Binding {
    let (target, value) = match parent.kind() {
        "variable_declarator" => ("name", "value"),
        "assignment_expression" | "assignment" => ("left", "right"),
        _ => return Binding::None,
    };
    if parent.child_by_field_name(value) != Some(child) {
        return Binding::NotValue;
    }
    parent
        .child_by_field_name(target)
        .map_or(Binding::None, |n| Binding::Name(text(n, source).to_owned()))
}

fn declarator_count(declaration: Node<'_>) -> usize {
    let mut cursor = declaration.walk();
    declaration
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "variable_declarator")
        .count()
}

/// Source text of a node.
pub(crate) fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

/// Named children that are not comments.
pub(crate) fn operands(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| !n.kind().ends_with("comment"))
        .collect()
}

/// Splits a quoted literal into its contents and opening quote.
pub(crate) fn unquote(literal: &str) -> Option<(String, char)> {
    let quote = literal.chars().next()?;
    if !matches!(quote, '\'' | '"' | '`') || literal.len() < 2 || !literal.ends_with(quote) {
        return None;
    }
    Some((literal[1..literal.len() - 1].to_owned(), quote))
}

/// Returns `true` if the node text ends with `;`.
pub(crate) fn ends_with_semicolon(node: Node<'_>, source: &str) -> bool {
    text(node, source).trim_end().ends_with(';')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ImportStyle, Value};
    use crate::parser::SyntaxParser;

    fn sites(language: SourceLanguage, source: &str) -> Sites {
        let mut parser = SyntaxParser::new();
        let tree = parser.parse(language, source).expect("should parse");
        collect_sites(language, &tree, source).expect("sites should be collected")
    }

    #[test]
    fn test_js_calls_and_imports() {
        let source = "import { percySnapshot } from '@percy/playwright';\n\
                      const percy = require('@percy/sdk-utils');\n\
                      await percySnapshot(page, 'Home', { widths: [375] });\n";
        let found = sites(SourceLanguage::TypeScript, source);

        assert_eq!(found.imports.len(), 2);
        assert_eq!(found.imports[0].module, "@percy/playwright");
        assert_eq!(found.imports[0].style, ImportStyle::Bound);
        assert!(found.imports[0].terminated);
        assert_eq!(
            found.imports[1].style,
            ImportStyle::Require {
                keyword: Some("const".to_owned())
            }
        );

        let call = found
            .calls
            .iter()
            .find(|c| c.name == "percySnapshot")
            .expect("call should be found");
        assert_eq!(call.receiver, None);
        assert_eq!(call.args.len(), 3);
        assert_eq!(call.args[1].as_str(), Some("Home"));
        assert!(call.args[2].is_object());
        assert_eq!(call.line, 3);
        let statement = call.statement.as_ref().expect("statement");
        assert!(statement.owned);
    }

    #[test]
    fn test_ownership() {
        let source = "const eyes = new Eyes();\n\
                      const a = 1, b = eyes.open(page);\n\
                      if (ok) eyes.close();\n\
                      foo(eyes.abort());\n";
        let found = sites(SourceLanguage::JavaScript, source);
        let by_name = |name: &str| {
            found
                .calls
                .iter()
                .find(|c| c.name == name)
                .expect("call should be found")
        };

        let ctor = by_name("Eyes");
        assert!(ctor.is_constructor);
        let statement = ctor.statement.as_ref().expect("statement");
        assert!(statement.owned);
        assert_eq!(statement.declared.as_deref(), Some("eyes"));

        let open = by_name("open").statement.as_ref().expect("statement");
        assert!(!open.owned);

        assert!(!by_name("close").statement.as_ref().expect("statement").owned);
        assert!(!by_name("abort").statement.as_ref().expect("statement").owned);
    }

    #[test]
    fn test_arrow_body_has_no_statement() {
        let found = sites(
            SourceLanguage::JavaScript,
            "afterEach(() => eyes.close());\n",
        );
        let close = found
            .calls
            .iter()
            .find(|c| c.name == "close")
            .expect("call should be found");
        assert!(close.statement.is_none());
    }

    #[test]
    fn test_python_kwargs() {
        let found = sites(
            SourceLanguage::Python,
            "percy_snapshot(driver, 'Home', widths=[768], full_page=True)\n",
        );
        let call = &found.calls[0];
        assert_eq!(call.name, "percy_snapshot");
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.kwargs.len(), 2);
        assert_eq!(call.kwargs[1].0, "full_page");
        assert_eq!(call.kwargs[1].1.value, Value::Bool(true));
    }

    #[test]
    fn test_java_import_package() {
        let found = sites(
            SourceLanguage::Java,
            "import com.applitools.eyes.selenium.Eyes;\nimport static org.junit.Assert.*;\nclass A {}\n",
        );
        assert_eq!(found.imports.len(), 1);
        assert_eq!(found.imports[0].module, "com.applitools.eyes.selenium");
    }

    #[test]
    fn test_import_bindings() {
        let found = sites(
            SourceLanguage::JavaScript,
            "import snap, { percySnapshot as shot, other } from '@percy/playwright';
             const { Eyes, Target: T } = require('@applitools/eyes-playwright');
             const percy = require('@percy/sdk-utils');
",
        );
        let pairs = |i: usize| -> Vec<(String, String)> {
            found.imports[i]
                .bindings
                .iter()
                .map(|b| (b.imported.clone(), b.local.clone()))
                .collect()
        };
        let owned = |a: &str, b: &str| (a.to_owned(), b.to_owned());
        assert_eq!(
            pairs(0),
            vec![owned("default", "snap"), owned("percySnapshot", "shot"), owned("other", "other")]
        );
        assert_eq!(pairs(1), vec![owned("Eyes", "Eyes"), owned("Target", "T")]);
        assert_eq!(pairs(2), vec![owned("default", "percy")]);

        let python = sites(
            SourceLanguage::Python,
            "from percy import percy_snapshot as snap, percy_screenshot
",
        );
        let bindings = &python.imports[0].bindings;
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].imported, "percy_snapshot");
        assert_eq!(bindings[0].local, "snap");
        assert!(bindings[1].is_plain());

        let java = sites(SourceLanguage::Java, "import com.applitools.eyes.selenium.Eyes;
class A {}
");
        assert_eq!(java.imports[0].bindings[0].local, "Eyes");
    }

    #[test]
    fn test_references_skip_comments_and_strings() {
        let source = "// checker.open()
const s = 'checker';
await checker.check();
";
        let mut parser = SyntaxParser::new();
        let tree = parser.parse(SourceLanguage::JavaScript, source).expect("should parse");
        let found = references(&tree, source);
        assert!(found.contains("checker"));
        assert!(found.contains("checker.check"));
        assert!(!found.contains("open"));

        let clean = "await smartuiSnapshot(page, 'checker');
";
        let tree = parser.parse(SourceLanguage::JavaScript, clean).expect("should parse");
        assert!(!references(&tree, clean).contains("checker"));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'a'"), Some(("a".to_owned(), '\'')));
        assert_eq!(unquote("\"\""), Some((String::new(), '"')));
        assert_eq!(unquote("abc"), None);
    }
}
