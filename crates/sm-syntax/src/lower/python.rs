//! Python node shapes.

use smallvec::SmallVec;
use tree_sitter::Node;

use super::{CallParts, operands, text, unquote};
use crate::ir::{CallExpr, Expr, ImportBinding, ImportSite, ImportStyle, Value};
use crate::parser::line_of;

type Arguments = (SmallVec<[Expr; 4]>, SmallVec<[(String, Expr); 2]>);

pub(super) fn lower_call(node: Node<'_>, source: &str) -> Option<CallParts> {
    let function = node.child_by_field_name("function")?;
    let (receiver, name) = match function.kind() {
        "identifier" => (None, text(function, source).to_owned()),
        "attribute" => {
            let object = function.child_by_field_name("object")?;
            let attribute = function.child_by_field_name("attribute")?;
            (
                Some(text(object, source).to_owned()),
                text(attribute, source).to_owned(),
            )
        }
        _ => return None,
    };
    let (args, kwargs) = arguments(node, source)?;
    Some(CallParts {
        callee: function.byte_range(),
        receiver,
        name,
        is_constructor: false,
        args,
        kwargs,
    })
}

fn arguments(call: Node<'_>, source: &str) -> Option<Arguments> {
    let list = call.child_by_field_name("arguments")?;
    if list.kind() != "argument_list" {
        return None;
    }
    let mut args = SmallVec::new();
    let mut kwargs = SmallVec::new();
    for arg in operands(list) {
        if arg.kind() == "keyword_argument" {
            let (Some(name), Some(value)) = (
                arg.child_by_field_name("name"),
                arg.child_by_field_name("value"),
            ) else {
                continue;
            };
            kwargs.push((text(name, source).to_owned(), lower_expr(value, source)));
        } else {
            args.push(lower_expr(arg, source));
        }
    }
    Some((args, kwargs))
}

fn lower_expr(node: Node<'_>, source: &str) -> Expr {
    let raw = text(node, source);
    let value = match node.kind() {
        "string" => string_value(node, raw),
        "integer" | "float" => Value::Number,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "none" => Value::Null,
        "list" | "tuple" | "set" => Value::Array(
            operands(node)
                .into_iter()
                .map(|n| lower_expr(n, source))
                .collect(),
        ),
        "dictionary" => Value::Object(dictionary_entries(node, source)),
        "call" => call_expr(node, source).map_or(Value::Raw, |c| Value::Call(Box::new(c))),
        "identifier" | "attribute" => Value::Ident,
        "parenthesized_expression" => operands(node)
            .first()
            .map_or(Value::Raw, |inner| lower_expr(*inner, source).value),
        _ => Value::Raw,
    };
    Expr::new(value, raw)
}

/// Plain single-line strings only; prefixed, triple-quoted and
/// interpolated strings stay raw.
fn string_value(node: Node<'_>, raw: &str) -> Value {
    let mut cursor = node.walk();
    let interpolated = node
        .named_children(&mut cursor)
        .any(|n| n.kind() == "interpolation");
    let prefixed = raw.starts_with(|c: char| c.is_ascii_alphabetic());
    if interpolated || prefixed || raw.starts_with("\"\"\"") || raw.starts_with("'''") {
        return Value::Raw;
    }
    unquote(raw).map_or(Value::Raw, |(inner, quote)| Value::Str { inner, quote })
}

fn dictionary_entries(node: Node<'_>, source: &str) -> Vec<(String, Expr)> {
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
                let key = unquote(key_text).map_or_else(|| key_text.to_owned(), |(k, _)| k);
                entries.push((key, lower_expr(value, source)));
            }
            "dictionary_splat" => {
                entries.push(("...".to_owned(), Expr::new(Value::Raw, text(child, source))));
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
        "attribute" => {
            let object = function.child_by_field_name("object")?;
            let attribute = function.child_by_field_name("attribute")?;
            (
                Some(lower_expr(object, source)),
                text(attribute, source).to_owned(),
            )
        }
        _ => return None,
    };
    let (args, kwargs) = arguments(node, source).unwrap_or_default();
    Some(CallExpr {
        receiver,
        name,
        args: args.into_vec(),
        kwargs: kwargs.into_vec(),
    })
}

/// `from m import a, b`. Relative imports never name a vendor module.
pub(super) fn lower_import(node: Node<'_>, source: &str) -> Option<ImportSite> {
    let module = node.child_by_field_name("module_name")?;
    if module.kind() != "dotted_name" {
        return None;
    }
    let mut cursor = node.walk();
    let bindings = node
        .children_by_field_name("name", &mut cursor)
        .filter_map(|name| match name.kind() {
            "dotted_name" => {
                let name = text(name, source);
                Some(ImportBinding::new(name, name))
            }
            "aliased_import" => Some(ImportBinding::new(
                text(name.child_by_field_name("name")?, source),
                text(name.child_by_field_name("alias")?, source),
            )),
            _ => None,
        })
        .collect();
    Some(ImportSite {
        span: node.byte_range(),
        module: text(module, source).to_owned(),
        module_span: module.byte_range(),
        quote: None,
        style: ImportStyle::PythonFrom,
        bindings,
        terminated: false,
        line: line_of(node),
    })
}
