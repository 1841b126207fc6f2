//! Target-language rendering of SmartUI constructs.
//!
//! Every generated snippet comes from here so the planner stays free of
//! per-language syntax. Output follows the source file's conventions where
//! they are known (string quotes, trailing semicolons).

use std::fmt::Write as _;

use sm_core::Framework;
use sm_core::mapping::target::{TARGET_JAVA_CLASS, TARGET_SNAPSHOT_FN};
use sm_core::mapping::to_snake_case;

use crate::ir::ImportStyle;
use crate::language::Family;
use crate::selector::Selector;

/// How the SmartUI snapshot is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetForm {
    /// `cy.smartuiSnapshot(name, options?)`
    Cypress,
    /// `smartuiSnapshot(driver, name, options?)` and its Python and Java
    /// equivalents.
    Function,
}

/// An entry of `ignoreDOM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreItem {
    /// A selector.
    Selector(Selector),
    /// An array expression spliced into the list.
    Spread(String),
}

/// The SmartUI options record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// `ignoreDOM.cssSelector`
    pub ignore_css: Vec<IgnoreItem>,
    /// `ignoreDOM.xpath`
    pub ignore_xpath: Vec<IgnoreItem>,
    /// `element`
    pub element: Option<Selector>,
    /// `fullPage`, rendered.
    pub full_page: Option<String>,
}

impl SnapshotOptions {
    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.ignore_css.is_empty()
            && self.ignore_xpath.is_empty()
            && self.element.is_none()
            && self.full_page.is_none()
    }

    /// Adds a selector to the matching ignore list.
    pub fn ignore(&mut self, selector: Selector) {
        if selector.is_xpath() {
            self.ignore_xpath.push(IgnoreItem::Selector(selector));
        } else {
            self.ignore_css.push(IgnoreItem::Selector(selector));
        }
    }
}

/// Renders snippets for one grammar family.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    family: Family,
}

impl Printer {
    /// Creates a printer.
    pub const fn new(family: Family) -> Self {
        Self { family }
    }

    /// Quote used for generated strings.
    pub const fn default_quote(self) -> char {
        match self.family {
            Family::JavaScript => '\'',
            Family::Python | Family::Java => '"',
        }
    }

    /// A string literal with the default quote.
    pub fn string(self, inner: &str) -> String {
        let q = self.default_quote();
        format!("{q}{inner}{q}")
    }

    /// A boolean literal.
    pub const fn boolean(self, value: bool) -> &'static str {
        match (self.family, value) {
            (Family::Python, true) => "True",
            (Family::Python, false) => "False",
            (_, true) => "true",
            (_, false) => "false",
        }
    }

    /// The callee of the snapshot call.
    pub fn snapshot_callee(self, form: TargetForm) -> String {
        match (form, self.family) {
            (TargetForm::Cypress, _) => format!("cy.{TARGET_SNAPSHOT_FN}"),
            (TargetForm::Function, Family::JavaScript) => TARGET_SNAPSHOT_FN.to_owned(),
            (TargetForm::Function, Family::Python) => to_snake_case(TARGET_SNAPSHOT_FN),
            (TargetForm::Function, Family::Java) => {
                format!("{TARGET_JAVA_CLASS}.{TARGET_SNAPSHOT_FN}")
            }
        }
    }

    /// The name bound by target imports.
    pub fn imported_name(self) -> String {
        match self.family {
            Family::JavaScript => TARGET_SNAPSHOT_FN.to_owned(),
            Family::Python => to_snake_case(TARGET_SNAPSHOT_FN),
            Family::Java => TARGET_JAVA_CLASS.to_owned(),
        }
    }

    /// A full snapshot call.
    pub fn snapshot_call(
        self,
        form: TargetForm,
        driver: Option<&str>,
        name: &str,
        options: &SnapshotOptions,
    ) -> String {
        self.snapshot_call_as(&self.snapshot_callee(form), form, driver, name, options)
    }

    /// A full snapshot call through `callee`, the local name an aliased
    /// import binds.
    pub fn snapshot_call_as(
        self,
        callee: &str,
        form: TargetForm,
        driver: Option<&str>,
        name: &str,
        options: &SnapshotOptions,
    ) -> String {
        let mut args: Vec<String> = Vec::with_capacity(3);
        if form == TargetForm::Function {
            args.extend(driver.map(str::to_owned));
        }
        args.push(name.to_owned());
        if !options.is_empty() {
            args.push(self.options(options));
        }
        format!("{callee}({})", args.join(", "))
    }

    /// The options record.
    pub fn options(self, options: &SnapshotOptions) -> String {
        let mut fields: Vec<(&str, String)> = Vec::new();
        let mut ignore: Vec<(&str, String)> = Vec::new();
        if !options.ignore_css.is_empty() {
            ignore.push(("cssSelector", self.list(&options.ignore_css)));
        }
        if !options.ignore_xpath.is_empty() {
            ignore.push(("xpath", self.list(&options.ignore_xpath)));
        }
        if !ignore.is_empty() {
            fields.push(("ignoreDOM", self.record(&ignore)));
        }
        if let Some(element) = &options.element {
            let key = if element.is_xpath() { "xpath" } else { "cssSelector" };
            fields.push(("element", self.record(&[(key, element.source())])));
        }
        if let Some(full_page) = &options.full_page {
            fields.push(("fullPage", full_page.clone()));
        }
        self.record(&fields)
    }

    fn record(self, fields: &[(&str, String)]) -> String {
        let mut out = String::new();
        match self.family {
            Family::JavaScript => {
                out.push_str("{ ");
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{key}: {value}");
                }
                out.push_str(" }");
            }
            Family::Python => {
                out.push('{');
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "\"{key}\": {value}");
                }
                out.push('}');
            }
            Family::Java => {
                out.push_str("java.util.Map.of(");
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "\"{key}\", {value}");
                }
                out.push(')');
            }
        }
        out
    }

    fn list(self, items: &[IgnoreItem]) -> String {
        let rendered: Vec<String> = items
            .iter()
            .map(|item| match item {
                IgnoreItem::Selector(selector) => selector.source(),
                IgnoreItem::Spread(expr) => match self.family {
                    Family::Python => format!("*{expr}"),
                    _ => format!("...{expr}"),
                },
            })
            .collect();
        match self.family {
            Family::Java => format!("java.util.List.of({})", rendered.join(", ")),
            _ => format!("[{}]", rendered.join(", ")),
        }
    }

    /// A statement asserting `selector` is visible, in the framework's
    /// idiom.
    pub fn visibility_assertion(self, framework: Framework, driver: &str, selector: &Selector) -> String {
        let s = selector.source();
        let xpath = selector.is_xpath();
        match (self.family, framework) {
            (Family::JavaScript, Framework::Cypress) => {
                let getter = if xpath { "xpath" } else { "get" };
                format!("cy.{getter}({s}).should('be.visible');")
            }
            (Family::JavaScript, Framework::Playwright | Framework::Storybook) => {
                format!("await expect({driver}.locator({s})).toBeVisible();")
            }
            (Family::JavaScript, Framework::WebdriverIO) => {
                format!("await expect($({s})).toBeDisplayed();")
            }
            (Family::JavaScript, Framework::Puppeteer) => {
                let target = if xpath { format!("'::-p-xpath(' + {s} + ')'") } else { s };
                format!("await {driver}.waitForSelector({target}, {{ visible: true }});")
            }
            (Family::JavaScript, Framework::Selenium | Framework::Appium) => {
                let by = if xpath { "xpath" } else { "css" };
                format!("assert.ok(await {driver}.findElement(By.{by}({s})).isDisplayed());")
            }
            (Family::Python, Framework::Playwright | Framework::Storybook) => {
                format!("expect({driver}.locator({s})).to_be_visible()")
            }
            (Family::Python, _) => {
                let by = if xpath { "XPATH" } else { "CSS_SELECTOR" };
                format!("assert {driver}.find_element(By.{by}, {s}).is_displayed()")
            }
            (Family::Java, Framework::Playwright | Framework::Storybook) => {
                format!("assertThat({driver}.locator({s})).isVisible();")
            }
            (Family::Java, _) => {
                let by = if xpath { "xpath" } else { "cssSelector" };
                format!("Assert.assertTrue({driver}.findElement(By.{by}({s})).isDisplayed());")
            }
        }
    }

    /// A line comment.
    pub fn comment(self, text: &str) -> String {
        format!("{} {text}", self.family.comment_prefix())
    }

    /// A complete import statement binding the target snapshot API to
    /// each of `locals`, or to its own name when `locals` is empty.
    ///
    /// Returns `None` for styles that are rewritten in place (side-effect
    /// imports and bare `require` calls).
    pub fn import_statement(
        self,
        style: &ImportStyle,
        target: &str,
        quote: Option<char>,
        terminated: bool,
        locals: &[String],
    ) -> Option<String> {
        let q = quote.unwrap_or_else(|| self.default_quote());
        let semi = if terminated { ";" } else { "" };
        let name = self.imported_name();
        let bind = |separator: &str| -> String {
            if locals.is_empty() {
                return name.clone();
            }
            locals
                .iter()
                .map(|local| {
                    if *local == name {
                        name.clone()
                    } else {
                        format!("{name}{separator}{local}")
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        match style {
            ImportStyle::Bound => Some(format!(
                "import {{ {} }} from {q}{target}{q}{semi}",
                bind(" as ")
            )),
            ImportStyle::Require { keyword: Some(keyword) } => Some(format!(
                "{keyword} {{ {} }} = require({q}{target}{q}){semi}",
                bind(": ")
            )),
            ImportStyle::PythonFrom => Some(format!("from {target} import {}", bind(" as "))),
            ImportStyle::Java => Some(format!("import {target};")),
            ImportStyle::SideEffect | ImportStyle::Require { keyword: None } => None,
        }
    }

    /// A quoted module reference for in-place rewrites.
    pub fn module_literal(self, target: &str, quote: Option<char>) -> String {
        let q = quote.unwrap_or_else(|| self.default_quote());
        format!("{q}{target}{q}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorKind;

    fn options() -> SnapshotOptions {
        let mut options = SnapshotOptions::default();
        options.ignore(Selector::literal(SelectorKind::Css, ".ad", '\''));
        options.ignore(Selector::literal(SelectorKind::Xpath, "//aside", '\''));
        options.element = Some(Selector::literal(SelectorKind::Css, "#main", '\''));
        options
    }

    #[test]
    fn test_javascript_call() {
        let printer = Printer::new(Family::JavaScript);
        let mut options = options();
        options.full_page = Some(printer.boolean(true).to_owned());
        insta::assert_snapshot!(
            printer.snapshot_call(TargetForm::Function, Some("page"), "'Home'", &options),
            @"smartuiSnapshot(page, 'Home', { ignoreDOM: { cssSelector: ['.ad'], xpath: ['//aside'] }, element: { cssSelector: '#main' }, fullPage: true })"
        );
    }

    #[test]
    fn test_cypress_call_has_no_driver() {
        let printer = Printer::new(Family::JavaScript);
        assert_eq!(
            printer.snapshot_call(TargetForm::Cypress, Some("cy"), "'Home'", &SnapshotOptions::default()),
            "cy.smartuiSnapshot('Home')"
        );
    }

    #[test]
    fn test_python_call() {
        let printer = Printer::new(Family::Python);
        let mut options = SnapshotOptions::default();
        options.ignore_css.push(IgnoreItem::Spread("AD_SLOTS".to_owned()));
        options.full_page = Some(printer.boolean(true).to_owned());
        insta::assert_snapshot!(
            printer.snapshot_call(TargetForm::Function, Some("driver"), "\"Home\"", &options),
            @r#"smartui_snapshot(driver, "Home", {"ignoreDOM": {"cssSelector": [*AD_SLOTS]}, "fullPage": True})"#
        );
    }

    #[test]
    fn test_java_call() {
        let printer = Printer::new(Family::Java);
        let mut options = SnapshotOptions::default();
        options.ignore(Selector::literal(SelectorKind::Css, ".ad", '"'));
        insta::assert_snapshot!(
            printer.snapshot_call(TargetForm::Function, Some("driver"), "\"Home\"", &options),
            @r#"SmartUISnapshot.smartuiSnapshot(driver, "Home", java.util.Map.of("ignoreDOM", java.util.Map.of("cssSelector", java.util.List.of(".ad"))))"#
        );
    }

    #[test]
    fn test_assertions_per_framework() {
        let css = Selector::literal(SelectorKind::Css, ".chart", '\'');
        let js = Printer::new(Family::JavaScript);
        assert_eq!(
            js.visibility_assertion(Framework::Cypress, "cy", &css),
            "cy.get('.chart').should('be.visible');"
        );
        assert_eq!(
            js.visibility_assertion(Framework::Playwright, "page", &css),
            "await expect(page.locator('.chart')).toBeVisible();"
        );
        assert_eq!(
            js.visibility_assertion(Framework::WebdriverIO, "browser", &css),
            "await expect($('.chart')).toBeDisplayed();"
        );

        let py = Printer::new(Family::Python);
        let xpath = Selector::literal(SelectorKind::Xpath, "//aside", '"');
        assert_eq!(
            py.visibility_assertion(Framework::Selenium, "driver", &xpath),
            "assert driver.find_element(By.XPATH, \"//aside\").is_displayed()"
        );

        let java = Printer::new(Family::Java);
        assert_eq!(
            java.visibility_assertion(Framework::Playwright, "page", &xpath),
            "assertThat(page.locator(\"//aside\")).isVisible();"
        );
    }

    #[test]
    fn test_imports() {
        let js = Printer::new(Family::JavaScript);
        assert_eq!(
            js.import_statement(&ImportStyle::Bound, "@lambdatest/playwright-driver", Some('"'), false, &[])
                .as_deref(),
            Some("import { smartuiSnapshot } from \"@lambdatest/playwright-driver\"")
        );
        assert_eq!(
            js.import_statement(
                &ImportStyle::Bound,
                "@lambdatest/playwright-driver",
                Some('\''),
                true,
                &["snap".to_owned()]
            )
            .as_deref(),
            Some("import { smartuiSnapshot as snap } from '@lambdatest/playwright-driver';")
        );
        assert_eq!(
            js.import_statement(
                &ImportStyle::Require { keyword: Some("const".to_owned()) },
                "@lambdatest/selenium-driver",
                Some('\''),
                true,
                &["smartuiSnapshot".to_owned(), "shot".to_owned()]
            )
            .as_deref(),
            Some("const { smartuiSnapshot, smartuiSnapshot: shot } = require('@lambdatest/selenium-driver');")
        );
        assert!(js.import_statement(&ImportStyle::SideEffect, "x", None, true, &[]).is_none());

        let py = Printer::new(Family::Python);
        assert_eq!(
            py.import_statement(&ImportStyle::PythonFrom, "lambdatest_selenium_driver", None, false, &[])
                .as_deref(),
            Some("from lambdatest_selenium_driver import smartui_snapshot")
        );
        assert_eq!(
            py.import_statement(
                &ImportStyle::PythonFrom,
                "lambdatest_selenium_driver",
                None,
                false,
                &["snap".to_owned()]
            )
            .as_deref(),
            Some("from lambdatest_selenium_driver import smartui_snapshot as snap")
        );
    }
}
