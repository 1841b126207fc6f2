//! JavaScript, TypeScript and TSX node shapes.

use smallvec::SmallVec;
use tree_sitter::Node;

use super::{CallParts, ends_with_semicolon, operands, text, unquote};
use crate::ir::{
    CallExpr, DEFAULT_EXPORT, Expr, ImportBinding, ImportSite, ImportStyle, NAMESPACE, Value,
};
use crate::parser::line_of;

pub(super) fn lower_call(node: Node<'_>, source: &str) -> Option<CallParts> {
    match node.kind() {
        "call_expression" => {
            let function = node.child_by_field_name("function")?;
            let (receiver, name) = callee_parts(function, source)?;
            let args = match node.child_by_field_name("arguments") {
                Some(a) if a.kind() == "arguments" => arguments(a, source),
                // tagged template
                Some(_) => return None,
                None => SmallVec::new(),
            };
            Some(CallParts {
                callee: function.byte_range(),
                receiver,
                name,
                is_constructor: false,
                args,
                kwargs: SmallVec::new(),
            })
        }
        "new_expression" => {
            let constructor = node.child_by_field_name("constructor")?;
            let (receiver, name) = callee_parts(constructor, source)?;
            let args = node
                .child_by_field_name("arguments")
                .map(|a| arguments(a, source))
                .unwrap_or_default();
            Some(CallParts {
                callee: constructor.byte_range(),
                receiver,
                name,
                is_constructor: true,
                args,
                kwargs: SmallVec::new(),
            })
        }
        _ => None,
    }
}

fn callee_parts(function: Node<'_>, source: &str) -> Option<(Option<String>, String)> {
    match function.kind() {
        "identifier" => Some((None, text(function, source).to_owned())),
        "member_expression" => {
            let object = function.child_by_field_name("object")?;
            let property = function.child_by_field_name("property")?;
            Some((
                Some(text(object, source).to_owned()),
                text(property, source).to_owned(),
            ))
        }
        _ => None,
    }
}

fn arguments(node: Node<'_>, source: &str) -> SmallVec<[Expr; 4]> {
    operands(node)
        .into_iter()
        .map(|n| lower_expr(n, source))
        .collect()
}

fn lower_expr(node: Node<'_>, source: &str) -> Expr {
    let raw = text(node, source);
    let value = match node.kind() {
        "string" => string_value(raw),
        "template_string" => {
            let mut cursor = node.walk();
            let interpolated = node
                .named_children(&mut cursor)
                .any(|n| n.kind() == "template_substitution");
            if interpolated { Value::Raw } else { string_value(raw) }
        }
        "number" => Value::Number,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "undefined" => Value::Null,
        "array" => Value::Array(
            operands(node)
                .into_iter()
                .map(|n| lower_expr(n, source))
                .collect(),
        ),
        "object" => Value::Object(object_entries(node, source)),
        "call_expression" => {
            call_expr(node, source).map_or(Value::Raw, |c| Value::Call(Box::new(c)))
        }
        "identifier" | "member_expression" | "this" | "property_identifier" => Value::Ident,
        "parenthesized_expression" | "as_expression" | "satisfies_expression"
        | "non_null_expression" => operands(node)
            .first()
            .map_or(Value::Raw, |inner| lower_expr(*inner, source).value),
        _ => Value::Raw,
    };
    Expr::new(value, raw)
}

fn string_value(raw: &str) -> Value {
    unquote(raw).map_or(Value::Raw, |(inner, quote)| Value::Str { inner, quote })
}

fn object_entries(node: Node<'_>, source: &str) -> Vec<(String, Expr)> {
    let mut entries = Vec::new();
    for child in operands(node) {
        match child.kind() {
            "pair" => {
                let (Some(key), Some(value)) = (
                    child.child_by_field_name("key"),
                    child.child_by_field_name("value"),
                ) else {
                    continue;
                };
                let key_text = text(key, source);
                let key = match key.kind() {
                    "string" => unquote(key_text).map_or_else(|| key_text.to_owned(), |(k, _)| k),
                    _ => key_text.to_owned(),
                };
                entries.push((key, lower_expr(value, source)));
            }
            "shorthand_property_identifier" => {
                let name = text(child, source);
                entries.push((name.to_owned(), Expr::new(Value::Ident, name)));
            }
            "spread_element" => {
                entries.push(("...".to_owned(), Expr::new(Value::Raw, text(child, source))));
            }
            "method_definition" => {
                let name = child
                    .child_by_field_name("name")
                    .map_or("", |n| text(n, source));
                entries.push((name.to_owned(), Expr::new(Value::Raw, text(child, source))));
            }
            _ => {}
        }
    }
    entries
}

fn call_expr(node: Node<'_>, source: &str) -> Option<CallExpr> {
    let function = node.child_by_field_name("function")?;
    let (receiver, name) = match function.kind() {
        "identifier" => (None, text(function, source).to_owned()),
        "member_expression" => {
            let object = function.child_by_field_name("object")?;
            let property = function.child_by_field_name("property")?;
            (
                Some(lower_expr(object, source)),
                text(property, source).to_owned(),
            )
        }
        _ => return None,
    };
    let args = node
        .child_by_field_name("arguments")
        .filter(|a| a.kind() == "arguments")
        .map(|a| arguments(a, source).into_vec())
        .unwrap_or_default();
    Some(CallExpr {
        receiver,
        name,
        args,
        kwargs: Vec::new(),
    })
}

pub(super) fn lower_import(node: Node<'_>, source: &str) -> Option<ImportSite> {
    let module = node.child_by_field_name("source")?;
    let (inner, quote) = unquote(text(module, source))?;
    let mut cursor = node.walk();
    let clause = node
        .children(&mut cursor)
        .find(|n| n.kind() == "import_clause");
    let bound = clause.is_some();
    Some(ImportSite {
        span: node.byte_range(),
        module: inner,
        module_span: module.byte_range(),
        quote: Some(quote),
        style: if bound {
            ImportStyle::Bound
        } else {
            ImportStyle::SideEffect
        },
        bindings: clause.map(|c| clause_bindings(c, source)).unwrap_or_default(),
        terminated: ends_with_semicolon(node, source),
        line: line_of(node),
    })
}

pub(super) fn lower_require(node: Node<'_>, source: &str) -> Option<ImportSite> {
    let arguments = node.child_by_field_name("arguments")?;
    let module = operands(arguments).into_iter().next()?;
    let (inner, quote) = unquote(text(module, source))?;

    let (span, keyword, terminated) = match sole_declaration(node) {
        Some(declaration) => {
            let keyword = declaration
                .child(0)
                .map(|k| text(k, source).to_owned())
                .filter(|k| matches!(k.as_str(), "const" | "let" | "var"));
            match keyword {
                Some(k) => (
                    declaration.byte_range(),
                    Some(k),
                    ends_with_semicolon(declaration, source),
                ),
                None => (node.byte_range(), None, false),
            }
        }
        None => (node.byte_range(), None, false),
    };

    Some(ImportSite {
        span,
        module: inner,
        module_span: module.byte_range(),
        quote: Some(quote),
        style: ImportStyle::Require { keyword },
        bindings: node
            .parent()
            .filter(|d| d.kind() == "variable_declarator")
            .and_then(|d| d.child_by_field_name("name"))
            .map(|pattern| pattern_bindings(pattern, source))
            .unwrap_or_default(),
        terminated,
        line: line_of(node),
    })
}

/// `a`, `{ b, c as d }` and `* as e` of an import clause.
fn clause_bindings(clause: Node<'_>, source: &str) -> Vec<ImportBinding> {
    let mut bindings = Vec::new();
    for child in operands(clause) {
        match child.kind() {
            "identifier" => bindings.push(ImportBinding::new(DEFAULT_EXPORT, text(child, source))),
            "namespace_import" => {
                if let Some(local) = operands(child).into_iter().find(|n| n.kind() == "identifier") {
                    bindings.push(ImportBinding::new(NAMESPACE, text(local, source)));
                }
            }
            "named_imports" => {
                for specifier in operands(child) {
                    let Some(name) = specifier.child_by_field_name("name") else {
                        continue;
                    };
                    let imported = text(name, source);
                    let imported = unquote(imported).map_or_else(|| imported.to_owned(), |(n, _)| n);
                    let local = specifier
                        .child_by_field_name("alias")
                        .map_or_else(|| imported.clone(), |a| text(a, source).to_owned());
                    bindings.push(ImportBinding::new(imported, local));
                }
            }
            _ => {}
        }
    }
    bindings
}

/// `const x = require(...)` binds the whole module; `const { a, b: c }`
/// binds members.
fn pattern_bindings(pattern: Node<'_>, source: &str) -> Vec<ImportBinding> {
    match pattern.kind() {
        "identifier" => vec![ImportBinding::new(DEFAULT_EXPORT, text(pattern, source))],
        "object_pattern" => operands(pattern)
            .into_iter()
            .filter_map(|entry| match entry.kind() {
                "shorthand_property_identifier_pattern" => {
                    let name = text(entry, source);
                    Some(ImportBinding::new(name, name))
                }
                "pair_pattern" => {
                    let key = entry.child_by_field_name("key")?;
                    let value = entry.child_by_field_name("value")?;
                    (value.kind() == "identifier")
                        .then(|| ImportBinding::new(text(key, source), text(value, source)))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// The declaration a `require` call initializes on its own, if any.
fn sole_declaration(call: Node<'_>) -> Option<Node<'_>> {
    let declarator = call.parent()?;
    if declarator.kind() != "variable_declarator"
        || declarator.child_by_field_name("value") != Some(call)
    {
        return None;
    }
    let declaration = declarator.parent()?;
    if !matches!(
        declaration.kind(),
        "lexical_declaration" | "variable_declaration"
    ) {
        return None;
    }
    let mut cursor = declaration.walk();
    let declarators = declaration
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "variable_declarator")
        .count();
    (declarators == 1).then_some(declaration)
}
