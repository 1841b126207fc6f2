//! Selector recognition.
//!
//! Source platforms pass regions as CSS strings, XPath strings, selector
//! objects (`{ selector: '//a', type: 'xpath' }`), locator helpers
//! (`By.cssSelector(...)`, Python `(By.ID, "x")`) or plain variables.
//! [`Selector::classify`] normalizes all of these into a CSS or XPath
//! selector that SmartUI's `ignoreDOM` and `element` records accept.

use sm_core::mapping::same_name;

use crate::ir::{Expr, Value};

/// Selector dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// CSS selector.
    Css,
    /// XPath expression.
    Xpath,
}

/// Selector source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorText {
    /// A string literal, kept with its original quote.
    Literal {
        /// Contents between the quotes.
        inner: String,
        /// Quote character.
        quote: char,
    },
    /// An expression evaluated at test time.
    Expr(String),
}

/// A normalized selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Dialect.
    pub kind: SelectorKind,
    /// Text.
    pub text: SelectorText,
}

impl Selector {
    /// Creates a literal selector.
    pub fn literal(kind: SelectorKind, inner: impl Into<String>, quote: char) -> Self {
        Self {
            kind,
            text: SelectorText::Literal {
                inner: inner.into(),
                quote,
            },
        }
    }

    /// Recognizes a selector value. `default` applies to bare strings and
    /// variables that carry no dialect of their own.
    ///
    /// # Examples
    ///
    /// ```
    /// use sm_syntax::ir::{Expr, Value};
    /// use sm_syntax::selector::{Selector, SelectorKind};
    ///
    /// let xpath = Expr::new(Value::Str { inner: "//main".into(), quote: '\'' }, "'//main'");
    /// let selector = Selector::classify(&xpath, SelectorKind::Css).expect("selector");
    /// assert_eq!(selector.kind, SelectorKind::Xpath);
    /// ```
    pub fn classify(expr: &Expr, default: SelectorKind) -> Option<Self> {
        match &expr.value {
            Value::Str { inner, quote } => Some(Self::literal(sniff(inner, default), inner.clone(), *quote)),
            Value::Ident => Some(Self {
                kind: default,
                text: SelectorText::Expr(expr.text.clone()),
            }),
            Value::Object(entries) => selector_object(entries),
            Value::Call(call) => {
                let receiver = call.receiver.as_ref()?;
                if !receiver.text.ends_with("By") {
                    return None;
                }
                locator(&call.name, call.args.first()?)
            }
            Value::Array(items) if items.len() == 2 => {
                let strategy = items[0].text.rsplit('.').next()?;
                locator(strategy, &items[1])
            }
            _ => None,
        }
    }

    /// The selector matching every descendant of this one.
    ///
    /// `quote` is used when the selector is an expression and a string
    /// must be appended to it.
    #[must_use]
    pub fn descendants(&self, quote: char) -> Self {
        let suffix = match self.kind {
            SelectorKind::Css => " *",
            SelectorKind::Xpath => "//*",
        };
        let text = match &self.text {
            SelectorText::Literal { inner, quote } => SelectorText::Literal {
                inner: format!("{inner}{suffix}"),
                quote: *quote,
            },
            SelectorText::Expr(expr) => {
                SelectorText::Expr(format!("{expr} + {quote}{suffix}{quote}"))
            }
        };
        Self {
            kind: self.kind,
            text,
        }
    }

    /// Source text as written (quoted for literals).
    pub fn source(&self) -> String {
        match &self.text {
            SelectorText::Literal { inner, quote } => format!("{quote}{inner}{quote}"),
            SelectorText::Expr(expr) => expr.clone(),
        }
    }

    /// Returns `true` for XPath selectors.
    pub fn is_xpath(&self) -> bool {
        self.kind == SelectorKind::Xpath
    }
}

fn sniff(inner: &str, default: SelectorKind) -> SelectorKind {
    if inner.starts_with("//") || inner.starts_with("(//") || inner.starts_with("xpath=") {
        SelectorKind::Xpath
    } else {
        default
    }
}

/// `{ selector: '...', type: 'css' | 'xpath' }`
fn selector_object(entries: &[(String, Expr)]) -> Option<Selector> {
    let value = entries.iter().find(|(k, _)| k == "selector").map(|(_, v)| v)?;
    let kind = match entries
        .iter()
        .find(|(k, _)| k == "type")
        .and_then(|(_, v)| v.as_str())
    {
        Some(t) if t.eq_ignore_ascii_case("xpath") => SelectorKind::Xpath,
        _ => SelectorKind::Css,
    };
    Selector::classify(value, kind)
}

/// `By.<strategy>(value)` and `(By.<STRATEGY>, value)`.
fn locator(strategy: &str, value: &Expr) -> Option<Selector> {
    let (kind, prefix) = if same_name(strategy, "cssSelector") || same_name(strategy, "css") {
        (SelectorKind::Css, "")
    } else if same_name(strategy, "xpath") {
        (SelectorKind::Xpath, "")
    } else if same_name(strategy, "id") {
        (SelectorKind::Css, "#")
    } else if same_name(strategy, "className") {
        (SelectorKind::Css, ".")
    } else {
        return None;
    };
    match &value.value {
        Value::Str { inner, quote } => Some(Selector::literal(kind, format!("{prefix}{inner}"), *quote)),
        Value::Ident if prefix.is_empty() => Some(Selector {
            kind,
            text: SelectorText::Expr(value.text.clone()),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::CallExpr;

    fn string(inner: &str) -> Expr {
        Expr::new(
            Value::Str {
                inner: inner.to_owned(),
                quote: '\'',
            },
            format!("'{inner}'"),
        )
    }

    #[test]
    fn test_plain_strings() {
        let css = Selector::classify(&string(".banner"), SelectorKind::Css).expect("selector");
        assert_eq!(css.kind, SelectorKind::Css);
        assert_eq!(css.source(), "'.banner'");

        let xpath = Selector::classify(&string("(//div)[1]"), SelectorKind::Css).expect("selector");
        assert!(xpath.is_xpath());
    }

    #[test]
    fn test_default_kind_applies_to_variables() {
        let ident = Expr::new(Value::Ident, "adSlot");
        let selector = Selector::classify(&ident, SelectorKind::Xpath).expect("selector");
        assert!(selector.is_xpath());
        assert_eq!(selector.source(), "adSlot");
    }

    #[test]
    fn test_by_helpers() {
        let call = |name: &str, arg: Expr| {
            Expr::new(
                Value::Call(Box::new(CallExpr {
                    receiver: Some(Expr::new(Value::Ident, "By")),
                    name: name.to_owned(),
                    args: vec![arg],
                    kwargs: Vec::new(),
                })),
                "",
            )
        };
        let id = Selector::classify(&call("id", string("nav")), SelectorKind::Css).expect("selector");
        assert_eq!(id.source(), "'#nav'");
        let class = Selector::classify(&call("className", string("ad")), SelectorKind::Css)
            .expect("selector");
        assert_eq!(class.source(), "'.ad'");
        let xpath = Selector::classify(&call("xpath", string("//x")), SelectorKind::Css)
            .expect("selector");
        assert!(xpath.is_xpath());
        assert!(Selector::classify(&call("linkText", string("Home")), SelectorKind::Css).is_none());
    }

    #[test]
    fn test_python_locator_tuple() {
        let tuple = Expr::new(
            Value::Array(vec![Expr::new(Value::Ident, "By.CSS_SELECTOR"), string(".ad")]),
            "(By.CSS_SELECTOR, '.ad')",
        );
        let selector = Selector::classify(&tuple, SelectorKind::Xpath).expect("selector");
        assert_eq!(selector.kind, SelectorKind::Css);
    }

    #[test]
    fn test_selector_object() {
        let object = Expr::new(
            Value::Object(vec![
                ("type".to_owned(), string("xpath")),
                ("selector".to_owned(), string("//footer")),
            ]),
            "",
        );
        let selector = Selector::classify(&object, SelectorKind::Css).expect("selector");
        assert!(selector.is_xpath());
    }

    #[test]
    fn test_descendants() {
        let css = Selector::literal(SelectorKind::Css, ".chart", '\'');
        assert_eq!(css.descendants('"').source(), "'.chart *'");

        let xpath = Selector::literal(SelectorKind::Xpath, "//aside", '"');
        assert_eq!(xpath.descendants('"').source(), "\"//aside//*\"");

        let expr = Selector {
            kind: SelectorKind::Css,
            text: SelectorText::Expr("region".to_owned()),
        };
        assert_eq!(expr.descendants('\'').source(), "region + ' *'");
    }
}
