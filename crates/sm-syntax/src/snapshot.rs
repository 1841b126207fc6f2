//! Snapshot and fluent-check rewrites.
//!
//! A matched snapshot call is reduced to three things: the driver, the
//! snapshot name and a [`SnapshotOptions`] record built from the source
//! options. If nothing but the callee differs, the callee alone is renamed.
//! Otherwise the call is rebuilt by the [`Printer`].
//!
//! Layout comparison has no SmartUI counterpart. Layout regions are
//! returned in [`Rewrite::emulated`]; the engine inserts a visibility
//! assertion for each and the options already ignore their descendants.

use sm_core::mapping::calls::DriverArg;
use sm_core::mapping::options::{OptionRole, option_role};
use sm_core::mapping::same_name;
use sm_core::{CodeChangeKind, Framework, FxHashSet, Platform, TransformationWarning, fx_hash_set};

use crate::ir::{CallExpr, CallSite, Expr, Value};
use crate::language::Family;
use crate::printer::{IgnoreItem, Printer, SnapshotOptions, TargetForm};
use crate::selector::{Selector, SelectorKind};

/// Per-file rewrite context.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub platform: Platform,
    pub framework: Framework,
    pub family: Family,
    pub printer: Printer,
    /// Local names the rewritten imports bind the snapshot function to.
    aliases: FxHashSet<String>,
    /// Callee for rebuilt function calls when no import binds the plain name.
    function_callee: Option<String>,
}

impl Scope {
    pub fn new(platform: Platform, framework: Framework, family: Family) -> Self {
        Self {
            platform,
            framework,
            family,
            printer: Printer::new(family),
            aliases: fx_hash_set(),
            function_callee: None,
        }
    }

    /// Keeps `aliases` as callees; `plain_bound` says whether some import
    /// also binds the plain snapshot function name.
    pub fn with_aliases(mut self, aliases: FxHashSet<String>, plain_bound: bool) -> Self {
        self.function_callee = if plain_bound {
            None
        } else {
            aliases.iter().min().cloned()
        };
        self.aliases = aliases;
        self
    }

    /// The callee a migrated call is written with.
    pub fn callee(&self, form: TargetForm, site: &CallSite) -> String {
        if form == TargetForm::Function {
            if site.receiver.is_none() && self.aliases.contains(&site.name) {
                return site.name.clone();
            }
            if let Some(callee) = &self.function_callee {
                return callee.clone();
            }
        }
        self.printer.snapshot_callee(form)
    }

    fn form(&self, site: &CallSite) -> TargetForm {
        let cypress = site.receiver.as_deref() == Some("cy") || self.framework == Framework::Cypress;
        if self.family == Family::JavaScript && cypress {
            TargetForm::Cypress
        } else {
            TargetForm::Function
        }
    }

    /// The receiver when it is the framework driver, else the assumed one.
    fn implicit_driver(&self, site: &CallSite) -> Driver {
        let conventional = self.framework.driver_identifier();
        match site.receiver.as_deref() {
            Some(receiver) if receiver == conventional => Driver {
                text: receiver.to_owned(),
                assumed: false,
            },
            _ => Driver {
                text: conventional.to_owned(),
                assumed: true,
            },
        }
    }
}

struct Driver {
    text: String,
    assumed: bool,
}

/// How the call itself is edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallEdit {
    /// Replace only the callee.
    Callee(String),
    /// Replace the whole call.
    Call(String),
}

/// A planned snapshot rewrite.
#[derive(Debug)]
pub(crate) struct Rewrite {
    pub kind: CodeChangeKind,
    pub edit: CallEdit,
    /// Layout regions needing a visibility assertion.
    pub emulated: Vec<Selector>,
    /// Driver expression for assertions.
    pub driver: String,
    /// The driver identifier was assumed rather than found.
    pub assumed_driver: bool,
    pub warnings: Vec<TransformationWarning>,
}

/// Rewrites a snapshot call.
pub(crate) fn plan_snapshot(scope: &Scope, site: &CallSite, driver: DriverArg, skip: u8) -> Rewrite {
    let form = scope.form(site);
    let callee = scope.callee(form, site);
    let mut args: &[Expr] = &site.args;
    let mut driver_in_args = false;

    let driver = match driver {
        DriverArg::Leading => match args.first() {
            Some(first) if !first.is_str() && !first.is_object() => {
                args = &args[1..];
                driver_in_args = true;
                Driver {
                    text: first.text.clone(),
                    assumed: false,
                }
            }
            _ => scope.implicit_driver(site),
        },
        DriverArg::Implicit => scope.implicit_driver(site),
    };
    let skip = usize::from(skip).min(args.len());
    args = &args[skip..];

    let mut builder = OptionsBuilder::new(scope, site.line);
    let mut name: Option<&Expr> = None;
    let mut record_seen = false;
    let mut dropped = false;
    for arg in args {
        match &arg.value {
            Value::Object(entries) if !record_seen => {
                record_seen = true;
                for (key, value) in entries {
                    builder.apply(key, OptionValue::Entry(value));
                }
            }
            Value::Object(_) => dropped |= builder.drop_argument(arg),
            _ if name.is_none() => name = Some(arg),
            _ => dropped |= builder.drop_argument(arg),
        }
    }
    for (key, value) in &site.kwargs {
        builder.apply(key, OptionValue::Entry(value));
    }

    let rename_only = skip == 0
        && !dropped
        && !builder.touched
        && name.is_some()
        && match form {
            TargetForm::Function => driver_in_args,
            TargetForm::Cypress => !driver_in_args && site.receiver.as_deref() == Some("cy"),
        };
    if rename_only {
        return Rewrite {
            kind: CodeChangeKind::Rename,
            edit: CallEdit::Callee(callee),
            emulated: Vec::new(),
            driver: driver.text,
            assumed_driver: false,
            warnings: builder.warnings,
        };
    }

    let touched = builder.touched;
    builder.finish(name, form, &callee, driver, touched)
}

/// Rewrites an Applitools `check(name?, Target...)` call.
pub(crate) fn plan_fluent(scope: &Scope, site: &CallSite) -> Rewrite {
    let form = scope.form(site);
    let callee = scope.callee(form, site);
    let driver = scope.implicit_driver(site);
    let mut builder = OptionsBuilder::new(scope, site.line);
    let mut name: Option<&Expr> = None;

    for arg in &site.args {
        match &arg.value {
            Value::Call(call) => match target_chain(call) {
                Some((root, modifiers)) => {
                    builder.apply_target(root);
                    for modifier in modifiers {
                        builder.apply(&modifier.name, OptionValue::Args(&modifier.args));
                    }
                }
                None if name.is_none() => name = Some(arg),
                None => {
                    builder.drop_argument(arg);
                }
            },
            Value::Object(entries) => {
                for (key, value) in entries {
                    builder.apply(key, OptionValue::Entry(value));
                }
            }
            _ if name.is_none() => name = Some(arg),
            _ => {
                builder.drop_argument(arg);
            }
        }
    }
    for (key, value) in &site.kwargs {
        builder.apply(key, OptionValue::Entry(value));
    }

    builder.finish(name, form, &callee, driver, true)
}

/// Splits `Target.root(...).m1(...).m2(...)` into the root call and the
/// modifiers in application order.
fn target_chain(call: &CallExpr) -> Option<(&CallExpr, Vec<&CallExpr>)> {
    let mut modifiers = Vec::new();
    let mut current = call;
    loop {
        let receiver = current.receiver.as_ref()?;
        match &receiver.value {
            Value::Ident if receiver.text.rsplit('.').next() == Some("Target") => {
                modifiers.reverse();
                return Some((current, modifiers));
            }
            Value::Call(inner) => {
                modifiers.push(current);
                current = inner;
            }
            _ => return None,
        }
    }
}

/// An option value as written.
#[derive(Clone, Copy)]
enum OptionValue<'a> {
    /// A record entry or keyword argument.
    Entry(&'a Expr),
    /// Fluent modifier arguments; empty for flags such as `.fully()`.
    Args(&'a [Expr]),
}

impl<'a> OptionValue<'a> {
    fn first(self) -> Option<&'a Expr> {
        match self {
            Self::Entry(e) => Some(e),
            Self::Args(args) => args.first(),
        }
    }
}

struct OptionsBuilder<'s> {
    scope: &'s Scope,
    line: u32,
    options: SnapshotOptions,
    name: Option<String>,
    layout: bool,
    layout_regions: Vec<Selector>,
    region_target: bool,
    touched: bool,
    warnings: Vec<TransformationWarning>,
}

impl<'s> OptionsBuilder<'s> {
    fn new(scope: &'s Scope, line: u32) -> Self {
        Self {
            scope,
            line,
            options: SnapshotOptions::default(),
            name: None,
            layout: false,
            layout_regions: Vec::new(),
            region_target: false,
            touched: false,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String, details: Option<&str>) {
        let mut warning = TransformationWarning::new(message).with_line(self.line);
        if let Some(details) = details {
            warning = warning.with_details(details);
        }
        self.warnings.push(warning);
    }

    fn drop_argument(&mut self, arg: &Expr) -> bool {
        self.warn(
            format!("argument `{}` dropped", arg.text),
            Some("SmartUI snapshots take a name and one options record"),
        );
        true
    }

    fn apply(&mut self, key: &str, value: OptionValue<'_>) {
        if key == "..." {
            if let Some(spread) = value.first() {
                self.warn(format!("option spread `{}` dropped", spread.text), None);
            }
            return;
        }
        self.touched = true;
        match option_role(self.scope.platform, key) {
            Some(OptionRole::IgnoreSelectors) => self.ignore(value, SelectorKind::Css),
            Some(OptionRole::IgnoreXpaths) => self.ignore(value, SelectorKind::Xpath),
            Some(OptionRole::ScopeSelector) => match value.first() {
                Some(expr) => match Selector::classify(expr, SelectorKind::Css) {
                    Some(selector) => self.options.element = Some(selector),
                    None => self.warn(
                        format!("scope `{}` dropped", expr.text),
                        Some("it cannot be expressed as a selector; the whole page is captured"),
                    ),
                },
                None => {}
            },
            Some(OptionRole::FullPage) => {
                let rendered = match value.first().map(|e| (&e.value, e)) {
                    None => self.scope.printer.boolean(true).to_owned(),
                    Some((Value::Bool(b), _)) => self.scope.printer.boolean(*b).to_owned(),
                    Some((_, expr)) => expr.text.clone(),
                };
                self.options.full_page = Some(rendered);
            }
            Some(OptionRole::Name) => {
                if let Some(expr) = value.first() {
                    self.name.get_or_insert_with(|| expr.text.clone());
                }
            }
            Some(OptionRole::LayoutRegions) => match value {
                OptionValue::Args([]) => self.layout = true,
                OptionValue::Entry(Expr {
                    value: Value::Bool(b),
                    ..
                }) => self.layout |= *b,
                _ => {
                    for item in items(value) {
                        match Selector::classify(item, SelectorKind::Css) {
                            Some(selector) => self.layout_regions.push(selector),
                            None => self.warn(
                                format!("layout region `{}` dropped", item.text),
                                Some("it cannot be expressed as a selector"),
                            ),
                        }
                    }
                }
            },
            Some(OptionRole::LayoutMatchLevel) => match value.first() {
                Some(expr) if is_layout_level(expr) => self.layout = true,
                Some(expr) => self.warn(
                    format!("option `{key}` dropped"),
                    Some(&format!(
                        "match level {} has no SmartUI equivalent; the default comparison is used",
                        expr.text
                    )),
                ),
                None => {}
            },
            Some(OptionRole::RegionTarget) => {
                self.region_target |= value
                    .first()
                    .and_then(Expr::as_str)
                    .is_some_and(|t| t.eq_ignore_ascii_case("region"));
            }
            Some(OptionRole::Discard) => {}
            Some(OptionRole::Unsupported { reason }) => {
                self.warn(format!("option `{key}` dropped"), Some(reason));
            }
            None => self.warn(
                format!("unknown option `{key}` dropped"),
                Some("it has no SmartUI mapping"),
            ),
        }
    }

    fn ignore(&mut self, value: OptionValue<'_>, default: SelectorKind) {
        if let OptionValue::Entry(expr) = value {
            let list_valued = matches!(expr.value, Value::Ident | Value::Raw)
                || (matches!(expr.value, Value::Call(_))
                    && Selector::classify(expr, default).is_none());
            if list_valued {
                self.spread(expr, default);
                return;
            }
        }
        for item in items(value) {
            match Selector::classify(item, default) {
                Some(selector) => self.options.ignore(selector),
                None => self.warn(
                    format!("ignore region `{}` dropped", item.text),
                    Some("only selector-based regions can be ignored in SmartUI"),
                ),
            }
        }
    }

    fn spread(&mut self, expr: &Expr, default: SelectorKind) {
        if self.scope.family == Family::Java {
            self.warn(
                format!("ignore list `{}` dropped", expr.text),
                Some("list its selectors explicitly in the SmartUI options"),
            );
            return;
        }
        let item = IgnoreItem::Spread(expr.text.clone());
        match default {
            SelectorKind::Css => self.options.ignore_css.push(item),
            SelectorKind::Xpath => self.options.ignore_xpath.push(item),
        }
    }

    /// `Target.window()`, `Target.region(sel)`, `Target.frame(...)`.
    fn apply_target(&mut self, root: &CallExpr) {
        if same_name(&root.name, "window") {
            return;
        }
        if same_name(&root.name, "region") {
            match root.args.first().and_then(|a| Selector::classify(a, SelectorKind::Css)) {
                Some(selector) => self.options.element = Some(selector),
                None => {
                    let text = root.args.first().map_or("", |a| a.text.as_str()).to_owned();
                    self.warn(
                        format!("region `{text}` dropped"),
                        Some("it cannot be expressed as a selector; the whole page is captured"),
                    );
                }
            }
            return;
        }
        self.warn(
            format!("check target `{}` is not supported", root.name),
            Some("the whole page is captured"),
        );
    }

    fn finish(
        mut self,
        name: Option<&Expr>,
        form: TargetForm,
        callee: &str,
        driver: Driver,
        touched: bool,
    ) -> Rewrite {
        if self.layout {
            match self.options.element.clone() {
                Some(element) => self.layout_regions.push(element),
                None => self.warn(
                    "layout match level on the whole page has no SmartUI equivalent".to_owned(),
                    Some("the snapshot is compared with the default match level"),
                ),
            }
        }
        if self.region_target && self.options.element.is_none() {
            self.warn(
                "region target without a selector".to_owned(),
                Some("the whole page is captured"),
            );
        }

        let quote = self.scope.printer.default_quote();
        let mut emulated: Vec<Selector> = Vec::new();
        for region in std::mem::take(&mut self.layout_regions) {
            if emulated.iter().any(|r| r.source() == region.source()) {
                continue;
            }
            self.options.ignore(region.descendants(quote));
            emulated.push(region);
        }

        let name = match (name, self.name.take()) {
            (Some(expr), _) => expr.text.clone(),
            (None, Some(option)) => option,
            (None, None) => {
                let placeholder = format!("snapshot-{}", self.line);
                self.warn(
                    format!("snapshot name missing; using `{placeholder}`"),
                    Some("rename the snapshot so baselines stay stable"),
                );
                self.scope.printer.string(&placeholder)
            }
        };

        let call = self.scope.printer.snapshot_call_as(
            callee,
            form,
            Some(driver.text.as_str()),
            &name,
            &self.options,
        );
        let kind = if !emulated.is_empty() {
            CodeChangeKind::Emulation
        } else if touched {
            CodeChangeKind::OptionRemap
        } else {
            CodeChangeKind::Rename
        };
        let assertion_driver = match form {
            TargetForm::Cypress => "cy".to_owned(),
            TargetForm::Function => driver.text,
        };
        Rewrite {
            kind,
            edit: CallEdit::Call(call),
            emulated,
            driver: assertion_driver,
            assumed_driver: driver.assumed && form == TargetForm::Function,
            warnings: self.warnings,
        }
    }
}

/// List items of an option value; arrays are flattened.
fn items(value: OptionValue<'_>) -> Vec<&Expr> {
    let exprs: &[Expr] = match value {
        OptionValue::Entry(e) => std::slice::from_ref(e),
        OptionValue::Args(args) => args,
    };
    exprs
        .iter()
        .flat_map(|e| match &e.value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            _ => vec![e],
        })
        .collect()
}

/// `'Layout'`, `"LAYOUT"`, `MatchLevel.Layout`, `MatchLevel.LAYOUT`.
fn is_layout_level(expr: &Expr) -> bool {
    match &expr.value {
        Value::Str { inner, .. } => inner.eq_ignore_ascii_case("layout"),
        Value::Ident => expr
            .text
            .rsplit('.')
            .next()
            .is_some_and(|last| last.eq_ignore_ascii_case("layout")),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn string(inner: &str) -> Expr {
        Expr::new(
            Value::Str {
                inner: inner.to_owned(),
                quote: '\'',
            },
            format!("'{inner}'"),
        )
    }

    fn site(receiver: Option<&str>, name: &str, args: Vec<Expr>) -> CallSite {
        CallSite {
            span: 0..1,
            callee: 0..1,
            receiver: receiver.map(str::to_owned),
            name: name.to_owned(),
            is_constructor: false,
            args: args.into_iter().collect(),
            kwargs: smallvec![],
            line: 7,
            statement: None,
        }
    }

    fn js(platform: Platform, framework: Framework) -> Scope {
        Scope::new(platform, framework, Family::JavaScript)
    }

    #[test]
    fn test_simple_call_is_renamed() {
        let scope = js(Platform::Percy, Framework::Playwright);
        let call = site(None, "percySnapshot", vec![Expr::new(Value::Ident, "page"), string("Home")]);
        let rewrite = plan_snapshot(&scope, &call, DriverArg::Leading, 0);
        assert_eq!(rewrite.kind, CodeChangeKind::Rename);
        assert_eq!(rewrite.edit, CallEdit::Callee("smartuiSnapshot".to_owned()));
        assert!(rewrite.warnings.is_empty());
    }

    #[test]
    fn test_options_are_remapped_in_order() {
        let scope = js(Platform::Percy, Framework::Playwright);
        let options = Expr::new(
            Value::Object(vec![
                (
                    "ignoreRegionSelectors".to_owned(),
                    Expr::new(
                        Value::Array(vec![string(".a"), string(".b"), string(".c")]),
                        "['.a', '.b', '.c']",
                    ),
                ),
                ("widths".to_owned(), Expr::new(Value::Raw, "[375]")),
            ]),
            "{...}",
        );
        let call = site(
            None,
            "percySnapshot",
            vec![Expr::new(Value::Ident, "page"), string("Home"), options],
        );
        let rewrite = plan_snapshot(&scope, &call, DriverArg::Leading, 0);
        assert_eq!(rewrite.kind, CodeChangeKind::OptionRemap);
        assert_eq!(
            rewrite.edit,
            CallEdit::Call(
                "smartuiSnapshot(page, 'Home', { ignoreDOM: { cssSelector: ['.a', '.b', '.c'] } })"
                    .to_owned()
            )
        );
        assert_eq!(rewrite.warnings.len(), 1);
        assert!(rewrite.warnings[0].message.contains("widths"));
    }

    #[test]
    fn test_implicit_driver_is_assumed() {
        let scope = js(Platform::Applitools, Framework::Playwright);
        let call = site(Some("eyes"), "checkWindow", vec![string("Home")]);
        let rewrite = plan_snapshot(&scope, &call, DriverArg::Implicit, 0);
        assert!(rewrite.assumed_driver);
        assert_eq!(rewrite.edit, CallEdit::Call("smartuiSnapshot(page, 'Home')".to_owned()));
    }

    #[test]
    fn test_cypress_command_is_renamed() {
        let scope = js(Platform::SauceLabs, Framework::Cypress);
        let call = site(Some("cy"), "sauceVisualCheck", vec![string("Home")]);
        let rewrite = plan_snapshot(&scope, &call, DriverArg::Implicit, 0);
        assert_eq!(rewrite.edit, CallEdit::Callee("cy.smartuiSnapshot".to_owned()));
        assert!(!rewrite.assumed_driver);
    }

    #[test]
    fn test_fluent_layout_region_is_emulated() {
        let scope = js(Platform::Applitools, Framework::Playwright);
        let target = Expr::new(Value::Ident, "Target");
        let region = CallExpr {
            receiver: Some(target),
            name: "region".to_owned(),
            args: vec![string("#chart")],
            kwargs: Vec::new(),
        };
        let layout = CallExpr {
            receiver: Some(Expr::new(Value::Call(Box::new(region)), "Target.region('#chart')")),
            name: "layout".to_owned(),
            args: Vec::new(),
            kwargs: Vec::new(),
        };
        let call = site(
            Some("eyes"),
            "check",
            vec![
                string("Chart"),
                Expr::new(Value::Call(Box::new(layout)), "Target.region('#chart').layout()"),
            ],
        );
        let rewrite = plan_fluent(&scope, &call);
        assert_eq!(rewrite.kind, CodeChangeKind::Emulation);
        assert_eq!(rewrite.emulated.len(), 1);
        assert_eq!(
            rewrite.edit,
            CallEdit::Call(
                "smartuiSnapshot(page, 'Chart', { ignoreDOM: { cssSelector: ['#chart *'] }, element: { cssSelector: '#chart' } })"
                    .to_owned()
            )
        );
    }

    #[test]
    fn test_missing_name_gets_placeholder() {
        let scope = Scope::new(Platform::Percy, Framework::Selenium, Family::Python);
        let call = site(None, "percy_snapshot", vec![Expr::new(Value::Ident, "driver")]);
        let rewrite = plan_snapshot(&scope, &call, DriverArg::Leading, 0);
        assert_eq!(
            rewrite.edit,
            CallEdit::Call("smartui_snapshot(driver, \"snapshot-7\")".to_owned())
        );
        assert!(rewrite.warnings[0].message.contains("snapshot-7"));
    }

    #[test]
    fn test_aliased_function_keeps_its_local_name() {
        let aliases: FxHashSet<String> = ["snap".to_owned()].into_iter().collect();
        let scope = js(Platform::Percy, Framework::Playwright).with_aliases(aliases, false);

        let call = site(None, "snap", vec![Expr::new(Value::Ident, "page"), string("Home")]);
        let rewrite = plan_snapshot(&scope, &call, DriverArg::Leading, 0);
        assert_eq!(rewrite.edit, CallEdit::Callee("snap".to_owned()));

        let call = site(None, "snap", vec![Expr::new(Value::Ident, "page")]);
        let rewrite = plan_snapshot(&scope, &call, DriverArg::Leading, 0);
        assert_eq!(
            rewrite.edit,
            CallEdit::Call("snap(page, 'snapshot-7')".to_owned())
        );

        let call = site(Some("percy"), "snapshot", vec![string("Home")]);
        let rewrite = plan_snapshot(&scope, &call, DriverArg::Implicit, 0);
        assert_eq!(rewrite.edit, CallEdit::Call("snap(page, 'Home')".to_owned()));
    }

    #[test]
    fn test_layout_match_level_detection() {
        assert!(is_layout_level(&string("Layout")));
        assert!(is_layout_level(&Expr::new(Value::Ident, "MatchLevel.LAYOUT")));
        assert!(!is_layout_level(&string("Strict")));
    }
}
