//! Java node shapes.
//!
//! Java has no collection literals, so `Arrays.asList(...)`, `List.of(...)`
//! and array initializers lower to [`Value::Array`], and `Map.of(k, v, ...)`
//! lowers to [`Value::Object`].

use smallvec::SmallVec;
use tree_sitter::Node;

use super::{CallParts, operands, text, unquote};
use crate::ir::{CallExpr, Expr, ImportBinding, ImportSite, ImportStyle, Value};
use crate::parser::line_of;

pub(super) fn lower_call(node: Node<'_>, source: &str) -> Option<CallParts> {
    match node.kind() {
        "method_invocation" => {
            let name = node.child_by_field_name("name")?;
            let object = node.child_by_field_name("object");
            let start = object.map_or(name.start_byte(), |o| o.start_byte());
            Some(CallParts {
                callee: start..name.end_byte(),
                receiver: object.map(|o| text(o, source).to_owned()),
                name: text(name, source).to_owned(),
                is_constructor: false,
                args: arguments(node, source),
                kwargs: SmallVec::new(),
            })
        }
        "object_creation_expression" => {
            let ty = node.child_by_field_name("type")?;
            let (receiver, class) = type_parts(ty, source)?;
            Some(CallParts {
                callee: ty.byte_range(),
                receiver,
                name: class,
                is_constructor: true,
                args: arguments(node, source),
                kwargs: SmallVec::new(),
            })
        }
        _ => None,
    }
}

/// Splits `a.b.Eyes` into `(Some("a.b"), "Eyes")`; generics are dropped.
fn type_parts(ty: Node<'_>, source: &str) -> Option<(Option<String>, String)> {
    match ty.kind() {
        "type_identifier" => Some((None, text(ty, source).to_owned())),
        "scoped_type_identifier" => {
            let full = text(ty, source);
            let (scope, class) = full.rsplit_once('.')?;
            Some((Some(scope.to_owned()), class.to_owned()))
        }
        "generic_type" => type_parts(ty.named_child(0)?, source),
        _ => None,
    }
}

fn arguments(node: Node<'_>, source: &str) -> SmallVec<[Expr; 4]> {
    node.child_by_field_name("arguments")
        .map(|list| {
            operands(list)
                .into_iter()
                .map(|n| lower_expr(n, source))
                .collect()
        })
        .unwrap_or_default()
}

fn lower_expr(node: Node<'_>, source: &str) -> Expr {
    let raw = text(node, source);
    let value = match node.kind() {
        "string_literal" if !raw.starts_with("\"\"\"") => {
            unquote(raw).map_or(Value::Raw, |(inner, quote)| Value::Str { inner, quote })
        }
        "decimal_integer_literal"
        | "hex_integer_literal"
        | "octal_integer_literal"
        | "binary_integer_literal"
        | "decimal_floating_point_literal"
        | "hex_floating_point_literal" => Value::Number,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null_literal" => Value::Null,
        "array_initializer" => Value::Array(elements(node, source)),
        "array_creation_expression" => node
            .child_by_field_name("value")
            .map_or(Value::Raw, |init| Value::Array(elements(init, source))),
        "method_invocation" => invocation_value(node, source),
        "identifier" | "field_access" => Value::Ident,
        "parenthesized_expression" => operands(node)
            .first()
            .map_or(Value::Raw, |inner| lower_expr(*inner, source).value),
        _ => Value::Raw,
    };
    Expr::new(value, raw)
}

fn elements(node: Node<'_>, source: &str) -> Vec<Expr> {
    operands(node)
        .into_iter()
        .map(|n| lower_expr(n, source))
        .collect()
}

enum Collection {
    List,
    Map,
}

fn invocation_value(node: Node<'_>, source: &str) -> Value {
    let Some(call) = call_expr(node, source) else {
        return Value::Raw;
    };
    let class = call
        .receiver
        .as_ref()
        .and_then(|r| r.text.rsplit('.').next());
    let collection = match (class, call.name.as_str()) {
        (Some("Arrays"), "asList") | (Some("List" | "Set"), "of") => Some(Collection::List),
        (Some("Map"), "of") => Some(Collection::Map),
        _ => None,
    };
    match collection {
        Some(Collection::List) => Value::Array(call.args),
        Some(Collection::Map) => {
            let mut entries = Vec::with_capacity(call.args.len() / 2);
            let mut args = call.args.into_iter();
            while let (Some(key), Some(value)) = (args.next(), args.next()) {
                let key = key.as_str().map_or_else(|| key.text.clone(), str::to_owned);
                entries.push((key, value));
            }
            Value::Object(entries)
        }
        None => Value::Call(Box::new(call)),
    }
}

fn call_expr(node: Node<'_>, source: &str) -> Option<CallExpr> {
    let name = node.child_by_field_name("name")?;
    Some(CallExpr {
        receiver: node
            .child_by_field_name("object")
            .map(|o| lower_expr(o, source)),
        name: text(name, source).to_owned(),
        args: arguments(node, source).into_vec(),
        kwargs: Vec::new(),
    })
}

/// `import a.b.C;` matches on package `a.b`; `import a.b.*;` on `a.b`.
/// Static imports are skipped.
pub(super) fn lower_import(node: Node<'_>, source: &str) -> Option<ImportSite> {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    if children.iter().any(|n| n.kind() == "static") {
        return None;
    }
    let path = children
        .iter()
        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))?;
    let wildcard = children.iter().any(|n| n.kind() == "asterisk");
    let full = text(*path, source);
    let (module, bindings) = if wildcard {
        (full.to_owned(), Vec::new())
    } else {
        let (package, class) = full.rsplit_once('.')?;
        (package.to_owned(), vec![ImportBinding::new(class, class)])
    };
    Some(ImportSite {
        span: node.byte_range(),
        module,
        module_span: path.byte_range(),
        quote: None,
        style: ImportStyle::Java,
        bindings,
        terminated: true,
        line: line_of(node),
    })
}
