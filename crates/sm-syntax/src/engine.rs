//! The syntax transform engine.
//!
//! A file is parsed once, every call and module reference is lowered into
//! the IR, and each site that matches a mapping rule becomes a plan:
//! an anchor range, a group of [`TextEdit`]s, change records and warnings.
//! Plans are accepted outermost-first; a plan whose anchor or edits touch an
//! accepted edit is discarded whole, so a nested site inside a deleted or
//! rebuilt construct never produces a second edit or a duplicate warning.
//!
//! # Example
//!
//! ```
//! use sm_core::{Framework, Platform};
//! use sm_syntax::{SourceLanguage, Transformer};
//!
//! let source = "import percySnapshot from '@percy/playwright';\n\
//!               await percySnapshot(page, 'Home');\n";
//! let mut transformer = Transformer::new();
//! let out = transformer.transform(
//!     SourceLanguage::JavaScript,
//!     source,
//!     Platform::Percy,
//!     Framework::Playwright,
//! );
//! assert_eq!(out.snapshot_count, 1);
//! assert!(out.content.contains("await smartuiSnapshot(page, 'Home');"));
//! assert!(out.content.contains("'@lambdatest/playwright-driver'"));
//! ```

use std::cmp::Reverse;
use std::ops::Range;

use camino::Utf8PathBuf;
use sm_core::mapping::calls::{
    CallShape, Strategy, default_snapshot_function, match_call, snapshot_function,
};
use sm_core::mapping::modules::module_rule;
use sm_core::{
    CodeChange, CodeChangeKind, Framework, FxHashMap, FxHashSet, Platform, TransformationWarning,
    TransformedFile, fx_hash_set,
};
use tracing::{debug, trace};

use crate::edit::{EditSet, TextEdit, indentation, line_extent};
use crate::error::ParseError;
use crate::ir::{CallSite, DEFAULT_EXPORT, ImportSite, ImportStyle, Sites};
use crate::language::SourceLanguage;
use crate::lower::{collect_sites, references};
use crate::parser::SyntaxParser;
use crate::snapshot::{CallEdit, Rewrite, Scope, plan_fluent, plan_snapshot};

/// The result of transforming one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Migrated text; identical to the input when nothing matched.
    pub content: String,
    /// Fidelity losses, ordered by line.
    pub warnings: Vec<TransformationWarning>,
    /// Snapshot constructs migrated.
    pub snapshot_count: usize,
    /// Edits made, ordered by line.
    pub changes: Vec<CodeChange>,
    /// The file could not be parsed and was left unchanged.
    pub parse_failed: bool,
}

impl TransformOutput {
    fn unchanged(source: &str, warning: TransformationWarning) -> Self {
        Self {
            content: source.to_owned(),
            warnings: vec![warning],
            snapshot_count: 0,
            changes: Vec::new(),
            parse_failed: true,
        }
    }

    /// Returns `true` if any edit was made.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Splits into the transformed file record and its warnings.
    #[must_use]
    pub fn into_file(self, path: impl Into<Utf8PathBuf>) -> (TransformedFile, Vec<TransformationWarning>) {
        let file = TransformedFile {
            original_path: path.into(),
            content: self.content,
            changes: self.changes,
            snapshot_count: self.snapshot_count,
        };
        (file, self.warnings)
    }
}

/// Rewrites vendor visual-testing code into SmartUI code.
///
/// Holds one lazily initialized parser per language; create one per thread.
#[derive(Debug, Default)]
pub struct Transformer {
    parser: SyntaxParser,
}

impl Transformer {
    /// Creates a transformer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transforms `source`.
    ///
    /// Never fails: a file that cannot be parsed is returned unchanged with
    /// a single warning.
    pub fn transform(
        &mut self,
        language: SourceLanguage,
        source: &str,
        platform: Platform,
        framework: Framework,
    ) -> TransformOutput {
        let tree = match self.parser.parse(language, source) {
            Ok(tree) => tree,
            Err(err) => {
                debug!(%language, error = %err, "leaving unparseable file unchanged");
                return TransformOutput::unchanged(source, unparsed(&err));
            }
        };
        let sites = match collect_sites(language, &tree, source) {
            Ok(sites) => sites,
            Err(err) => return TransformOutput::unchanged(source, unparsed(&err)),
        };
        trace!(
            %language,
            calls = sites.calls.len(),
            imports = sites.imports.len(),
            "collected sites"
        );

        let bindings = Bindings::collect(platform, language, &sites);
        let planner = Planner {
            scope: Scope::new(platform, framework, language.family())
                .with_aliases(bindings.kept.clone(), bindings.plain_bound),
            language,
            source,
            bindings,
        };
        let mut plans: Vec<Plan> = Vec::new();
        let mut imported: FxHashSet<&'static str> = fx_hash_set();
        plans.extend(
            sites
                .imports
                .iter()
                .filter_map(|site| planner.import(site, &mut imported)),
        );
        plans.extend(sites.calls.iter().filter_map(|site| planner.call(site)));
        plans.sort_by_key(|p| (p.anchor.start, Reverse(p.anchor.end)));

        let mut edits = EditSet::new();
        let mut out = TransformOutput {
            content: String::new(),
            warnings: Vec::new(),
            snapshot_count: 0,
            changes: Vec::new(),
            parse_failed: false,
        };
        let mut assumed_driver_line: Option<u32> = None;
        let mut unbound: Vec<Unbound> = Vec::new();
        for plan in plans {
            if !edits.try_accept(&plan.anchor, plan.edits) {
                trace!(line = plan.line, "skipped site nested in an accepted edit");
                continue;
            }
            out.warnings.extend(plan.warnings);
            out.changes.extend(plan.changes);
            out.snapshot_count += plan.snapshots;
            unbound.extend(plan.unbound);
            if plan.assumed_driver && assumed_driver_line.is_none() {
                assumed_driver_line = Some(plan.line);
            }
        }
        if let Some(line) = assumed_driver_line {
            out.warnings.push(
                TransformationWarning::new(format!(
                    "assumed driver identifier `{}` for snapshot calls without a driver argument",
                    framework.driver_identifier()
                ))
                .with_details("rename it if the test uses a different variable")
                .with_line(line),
            );
        }

        debug!(
            %language,
            edits = edits.len(),
            snapshots = out.snapshot_count,
            "transformed source"
        );
        if edits.is_empty() {
            out.content = source.to_owned();
        } else {
            out.content = edits.apply(source);
            let dangling = self.dangling(language, &out.content, &unbound);
            out.warnings.extend(dangling);
        }
        out.warnings.sort_by_key(|w| w.line);
        out.changes.sort_by_key(|c| c.line);
        out
    }

    /// Warns for each removed binding the rewritten `content` still uses.
    fn dangling(
        &mut self,
        language: SourceLanguage,
        content: &str,
        unbound: &[Unbound],
    ) -> Vec<TransformationWarning> {
        if unbound.is_empty() {
            return Vec::new();
        }
        let tree = match self.parser.parse_lenient(language, content) {
            Ok(tree) => tree,
            Err(err) => {
                debug!(%language, error = %err, "skipped the reference check");
                return Vec::new();
            }
        };
        let referenced = references(&tree, content);
        unbound
            .iter()
            .filter(|u| referenced.contains(&u.name))
            .map(|u| {
                TransformationWarning::new(format!("`{}` is still referenced but {}", u.name, u.loss))
                    .with_details("update or remove the remaining references")
                    .with_line(u.line)
            })
            .collect()
    }
}

/// Transforms `source` with a fresh [`Transformer`].
pub fn transform(
    language: SourceLanguage,
    source: &str,
    platform: Platform,
    framework: Framework,
) -> TransformOutput {
    Transformer::new().transform(language, source, platform, framework)
}

fn unparsed(err: &ParseError) -> TransformationWarning {
    let warning = TransformationWarning::new("file could not be parsed; left unchanged")
        .with_details(err.to_string());
    match err {
        ParseError::Syntax { line } => warning.with_line(*line),
        _ => warning,
    }
}

/// Vendor names bound by imports and constructions in one file.
#[derive(Debug, Default)]
struct Bindings {
    /// Local function name to the vendor snapshot function it stands for.
    functions: FxHashMap<String, &'static str>,
    /// Local names rebound to the SmartUI snapshot function.
    kept: FxHashSet<String>,
    /// Some vendor import also binds a name that is not kept.
    plain_bound: bool,
    /// Declared instance name to the receiver its methods match as.
    instances: FxHashMap<String, &'static str>,
}

impl Bindings {
    fn collect(platform: Platform, language: SourceLanguage, sites: &Sites) -> Self {
        let mut bindings = Self::default();
        let receivers: FxHashSet<&str> = sites
            .calls
            .iter()
            .filter_map(|c| c.receiver.as_deref())
            .map(|r| r.split_once('.').map_or(r, |(root, _)| root))
            .collect();

        for site in &sites.imports {
            if module_rule(platform, language.ecosystem(), &site.module).is_none() {
                continue;
            }
            let mut plain = site.bindings.is_empty();
            for binding in &site.bindings {
                let canonical = if binding.imported == DEFAULT_EXPORT {
                    default_snapshot_function(platform)
                } else {
                    snapshot_function(platform, &binding.imported)
                };
                let Some(canonical) = canonical else {
                    plain = true;
                    continue;
                };
                bindings.functions.insert(binding.local.clone(), canonical);
                if snapshot_function(platform, &binding.local).is_none()
                    && !receivers.contains(binding.local.as_str())
                {
                    bindings.kept.insert(binding.local.clone());
                } else {
                    plain = true;
                }
            }
            bindings.plain_bound |= plain;
        }

        for site in &sites.calls {
            let Some(declared) = site.statement.as_ref().and_then(|s| s.declared.as_deref()) else {
                continue;
            };
            let instance = match_call(platform, site.receiver.as_deref(), &site.name, site.is_constructor)
                .and_then(|rule| rule.instance());
            if let Some(instance) = instance {
                bindings.instances.insert(declared.to_owned(), instance);
            }
        }
        trace!(
            functions = bindings.functions.len(),
            instances = bindings.instances.len(),
            "resolved vendor bindings"
        );
        bindings
    }
}

/// A name whose binding a plan removes.
#[derive(Debug)]
struct Unbound {
    name: String,
    line: u32,
    loss: &'static str,
}

/// Everything one matched site contributes, accepted or discarded whole.
#[derive(Debug)]
struct Plan {
    anchor: Range<usize>,
    edits: Vec<TextEdit>,
    changes: Vec<CodeChange>,
    warnings: Vec<TransformationWarning>,
    unbound: Vec<Unbound>,
    snapshots: usize,
    assumed_driver: bool,
    line: u32,
}

impl Plan {
    fn new(anchor: Range<usize>, line: u32) -> Self {
        Self {
            anchor,
            edits: Vec::new(),
            changes: Vec::new(),
            warnings: Vec::new(),
            unbound: Vec::new(),
            snapshots: 0,
            assumed_driver: false,
            line,
        }
    }

    fn warn(&mut self, message: String, details: &str) {
        self.warnings.push(
            TransformationWarning::new(message)
                .with_details(details)
                .with_line(self.line),
        );
    }

    fn unbind(&mut self, name: &str, loss: &'static str) {
        self.unbound.push(Unbound {
            name: name.to_owned(),
            line: self.line,
            loss,
        });
    }
}

struct Planner<'s> {
    scope: Scope,
    language: SourceLanguage,
    source: &'s str,
    bindings: Bindings,
}

impl Planner<'_> {
    fn slice(&self, range: &Range<usize>) -> &str {
        self.source.get(range.clone()).unwrap_or_default()
    }

    fn import(&self, site: &ImportSite, imported: &mut FxHashSet<&'static str>) -> Option<Plan> {
        let rule = module_rule(self.scope.platform, self.language.ecosystem(), &site.module)?;
        let target = rule.target.resolve(self.scope.framework);
        let printer = self.scope.printer;
        let mut plan = Plan::new(site.span.clone(), site.line);
        let original = self.slice(&site.span).to_owned();
        let locals = self.locals(site);

        match printer.import_statement(&site.style, target, site.quote, site.terminated, &locals) {
            Some(_) if locals.is_empty() && !imported.insert(target) => {
                self.unbind_imports(site, &mut plan);
                plan.edits.push(TextEdit::delete(line_extent(self.source, &site.span)));
                plan.changes.push(CodeChange {
                    kind: CodeChangeKind::Import,
                    original,
                    replacement: String::new(),
                    line: site.line,
                    description: format!("removed duplicate import of `{}`", site.module),
                });
            }
            Some(statement) => {
                self.unbind_imports(site, &mut plan);
                plan.edits.push(TextEdit::replace(site.span.clone(), statement.clone()));
                plan.changes.push(CodeChange {
                    kind: CodeChangeKind::Import,
                    original,
                    replacement: statement,
                    line: site.line,
                    description: format!("`{}` -> `{target}`", site.module),
                });
            }
            None => {
                let literal = printer.module_literal(target, site.quote);
                let replacement = format!(
                    "{}{literal}{}",
                    self.slice(&(site.span.start..site.module_span.start)),
                    self.slice(&(site.module_span.end..site.span.end)),
                );
                plan.edits.push(TextEdit::replace(site.module_span.clone(), literal));
                plan.changes.push(CodeChange {
                    kind: CodeChangeKind::Import,
                    original,
                    replacement,
                    line: site.line,
                    description: format!("`{}` -> `{target}`", site.module),
                });
                if matches!(site.style, ImportStyle::Require { keyword: None }) {
                    plan.warn(
                        format!("`require('{}')` repointed in place", site.module),
                        "check that the bindings it produces are still used correctly",
                    );
                }
            }
        }
        Some(plan)
    }

    /// Names a rewritten import binds: empty for the plain name alone.
    fn locals(&self, site: &ImportSite) -> Vec<String> {
        let kept: Vec<String> = site
            .bindings
            .iter()
            .filter(|b| self.bindings.kept.contains(&b.local))
            .map(|b| b.local.clone())
            .collect();
        if kept.is_empty() {
            return kept;
        }
        let mut locals = Vec::with_capacity(kept.len() + 1);
        if site.bindings.len() > kept.len() {
            locals.push(self.scope.printer.imported_name());
        }
        locals.extend(kept);
        locals
    }

    fn unbind_imports(&self, site: &ImportSite, plan: &mut Plan) {
        let plain = self.scope.printer.imported_name();
        for binding in &site.bindings {
            if binding.local != plain && !self.bindings.kept.contains(&binding.local) {
                plan.unbind(&binding.local, "it is no longer imported");
            }
        }
    }

    fn call(&self, site: &CallSite) -> Option<Plan> {
        let receiver = site
            .receiver
            .as_deref()
            .map(|r| self.bindings.instances.get(r).copied().unwrap_or(r));
        let name = match receiver {
            None => self
                .bindings
                .functions
                .get(&site.name)
                .copied()
                .unwrap_or(site.name.as_str()),
            Some(_) => site.name.as_str(),
        };
        let rule = match_call(self.scope.platform, receiver, name, site.is_constructor)?;
        let plan = match rule.strategy {
            Strategy::Snapshot { driver, skip } => {
                self.rewrite(site, plan_snapshot(&self.scope, site, driver, skip))
            }
            Strategy::FluentCheck => self.rewrite(site, plan_fluent(&self.scope, site)),
            Strategy::Remove => {
                self.removal(site, matches!(rule.shape, CallShape::Constructor { .. }))
            }
        };
        Some(plan)
    }

    fn rewrite(&self, site: &CallSite, rewrite: Rewrite) -> Plan {
        let mut plan = Plan::new(site.span.clone(), site.line);
        let original = site.text(self.source).to_owned();
        let replacement = match &rewrite.edit {
            CallEdit::Callee(callee) => {
                if self.slice(&site.callee) != callee {
                    plan.edits.push(TextEdit::replace(site.callee.clone(), callee.clone()));
                }
                format!(
                    "{}{callee}{}",
                    self.slice(&(site.span.start..site.callee.start)),
                    self.slice(&(site.callee.end..site.span.end)),
                )
            }
            CallEdit::Call(call) => {
                plan.edits.push(TextEdit::replace(site.span.clone(), call.clone()));
                call.clone()
            }
        };
        let description = match rewrite.kind {
            CodeChangeKind::Emulation => format!("`{}` migrated with layout emulation", site.name),
            CodeChangeKind::OptionRemap => format!("`{}` migrated with remapped options", site.name),
            _ => format!("`{}` renamed to the SmartUI snapshot call", site.name),
        };

        if !rewrite.emulated.is_empty() {
            self.emulate(site, &rewrite, &mut plan);
        }
        let emulation = std::mem::replace(&mut plan.warnings, rewrite.warnings);
        plan.warnings.extend(emulation);
        plan.changes.push(CodeChange {
            kind: rewrite.kind,
            original,
            replacement,
            line: site.line,
            description,
        });
        plan.snapshots = 1;
        plan.assumed_driver = rewrite.assumed_driver;
        plan
    }

    /// Inserts a visibility assertion for each emulated layout region above
    /// the snapshot statement.
    fn emulate(&self, site: &CallSite, rewrite: &Rewrite, plan: &mut Plan) {
        let printer = self.scope.printer;
        let start = site
            .statement
            .as_ref()
            .map(|s| s.span.start)
            .filter(|&start| {
                let line_start = self.source.get(..start).and_then(|s| s.rfind('\n')).map_or(0, |i| i + 1);
                self.slice(&(line_start..start)).trim().is_empty()
            });

        let Some(start) = start else {
            for region in &rewrite.emulated {
                plan.warn(
                    format!(
                        "layout region `{}` emulated without a visibility assertion",
                        region.source()
                    ),
                    "the snapshot is not a standalone statement; assert the region is visible before it",
                );
            }
            return;
        };

        let indent = indentation(self.source, start);
        let mut text = String::new();
        for region in &rewrite.emulated {
            text.push_str(&printer.visibility_assertion(self.scope.framework, &rewrite.driver, region));
            text.push('\n');
            text.push_str(indent);
            plan.warn(
                format!(
                    "layout region `{}` emulated with a visibility assertion and ignored descendants",
                    region.source()
                ),
                "SmartUI has no layout match level",
            );
        }
        text.push_str(&printer.comment(
            "layout comparison emulated: region asserted visible, its contents ignored",
        ));
        text.push('\n');
        text.push_str(indent);
        plan.edits.push(TextEdit::insert(start, text));
    }

    fn removal(&self, site: &CallSite, construction: bool) -> Plan {
        let mut plan = Plan::new(site.span.clone(), site.line);
        match &site.statement {
            Some(statement) if statement.owned => {
                plan.edits.push(TextEdit::delete(line_extent(self.source, &statement.span)));
                plan.changes.push(CodeChange {
                    kind: CodeChangeKind::Removal,
                    original: self.slice(&statement.span).to_owned(),
                    replacement: String::new(),
                    line: site.line,
                    description: format!("removed `{}` session call", site.name),
                });
                match statement.declared.as_deref() {
                    Some(name) if construction => plan.unbind(name, "its declaration was removed"),
                    Some(name) => plan.warn(
                        format!("removed declaration of `{name}`"),
                        "later references to it must be updated",
                    ),
                    None => {}
                }
            }
            _ => plan.warn(
                format!("`{}` was not removed", site.text(self.source)),
                "the call is part of a larger expression",
            ),
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js(source: &str, platform: Platform, framework: Framework) -> TransformOutput {
        transform(SourceLanguage::JavaScript, source, platform, framework)
    }

    #[test]
    fn test_percy_rename_and_import() {
        let source = "\
import percySnapshot from '@percy/playwright';

test('home', async ({ page }) => {
  await page.goto('/');
  await percySnapshot(page, 'Home page');
});
";
        let out = js(source, Platform::Percy, Framework::Playwright);
        insta::assert_snapshot!(out.content, @r"
        import { smartuiSnapshot } from '@lambdatest/playwright-driver';

        test('home', async ({ page }) => {
          await page.goto('/');
          await smartuiSnapshot(page, 'Home page');
        });
        ");
        assert_eq!(out.snapshot_count, 1);
        assert!(out.warnings.is_empty());
        assert_eq!(out.changes.len(), 2);
        assert_eq!(out.changes[1].kind, CodeChangeKind::Rename);
    }

    #[test]
    fn test_ignore_selectors_keep_order() {
        let source = "\
await percySnapshot(page, 'Dashboard', {
  ignoreRegionSelectors: ['.ad', '#clock', '.carousel', '[data-live]'],
  widths: [375, 1280],
});
";
        let out = js(source, Platform::Percy, Framework::Playwright);
        assert!(out.content.contains(
            "smartuiSnapshot(page, 'Dashboard', { ignoreDOM: { cssSelector: ['.ad', '#clock', '.carousel', '[data-live]'] } })"
        ));
        assert_eq!(out.changes[0].kind, CodeChangeKind::OptionRemap);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].message.contains("widths"));
        assert_eq!(out.warnings[0].line, Some(1));
    }

    #[test]
    fn test_layout_region_is_emulated() {
        let source = "\
test('chart', async ({ page }) => {
  await eyes.check('Chart', Target.region('#chart').layout());
});
";
        let out = js(source, Platform::Applitools, Framework::Playwright);
        insta::assert_snapshot!(out.content, @r"
        test('chart', async ({ page }) => {
          await expect(page.locator('#chart')).toBeVisible();
          // layout comparison emulated: region asserted visible, its contents ignored
          await smartuiSnapshot(page, 'Chart', { ignoreDOM: { cssSelector: ['#chart *'] }, element: { cssSelector: '#chart' } });
        });
        ");
        assert_eq!(out.snapshot_count, 1);
        assert_eq!(out.changes[0].kind, CodeChangeKind::Emulation);
        assert!(out.warnings.iter().any(|w| w.message.contains("emulated")));
        assert!(out.warnings.iter().any(|w| w.message.contains("assumed driver")));
    }

    #[test]
    fn test_session_calls_are_removed() {
        let source = "\
const { Eyes, Target } = require('@applitools/eyes-playwright');
const eyes = new Eyes();
await eyes.open(page, 'App', 'Home');
await eyes.checkWindow('Home');
const results = await eyes.close();
";
        let out = js(source, Platform::Applitools, Framework::Playwright);
        insta::assert_snapshot!(out.content, @r"
        const { smartuiSnapshot } = require('@lambdatest/playwright-driver');
        await smartuiSnapshot(page, 'Home');
        ");
        assert_eq!(out.snapshot_count, 1);
        assert!(out.warnings.iter().any(|w| w.message == "removed declaration of `results`"));
        assert!(!out.warnings.iter().any(|w| w.message.contains("`eyes`")));
    }

    #[test]
    fn test_removal_inside_expression_is_reported() {
        let source = "if (ok) eyes.close();\nlog(eyes.abort());\n";
        let out = js(source, Platform::Applitools, Framework::Playwright);
        assert_eq!(out.content, source);
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings.iter().all(|w| w.message.ends_with("was not removed")));
    }

    #[test]
    fn test_nested_construction_is_removed_once() {
        let source = "const eyes = new Eyes(new VisualGridRunner({ testConcurrency: 5 }));\nrun();\n";
        let out = js(source, Platform::Applitools, Framework::Playwright);
        assert_eq!(out.content, "run();\n");
        assert_eq!(out.changes.len(), 1);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_comments_and_strings_are_untouched() {
        let source = "\
// percySnapshot(page, 'old');
const label = \"percySnapshot(page, 'x')\";
";
        let out = js(source, Platform::Percy, Framework::Playwright);
        assert_eq!(out.content, source);
        assert!(out.changes.is_empty());
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let source = "\
import { test } from '@playwright/test';
import percySnapshot from '@percy/playwright';
test('a', async ({ page }) => {
  await percySnapshot(page, 'A', { ignoreRegionSelectors: ['.ad'], scope: '#main' });
  await eyes.check('Chart', Target.region('#chart').layout());
});
";
        let first = js(source, Platform::Percy, Framework::Playwright);
        let second = js(&first.content, Platform::Percy, Framework::Playwright);
        assert_eq!(second.content, first.content);
        assert!(second.changes.is_empty());
        assert!(second.warnings.is_empty());

        let applitools = js(&first.content, Platform::Applitools, Framework::Playwright);
        let again = js(&applitools.content, Platform::Applitools, Framework::Playwright);
        assert_eq!(again.content, applitools.content);
        assert!(again.changes.is_empty());
        assert!(again.warnings.is_empty());
    }

    #[test]
    fn test_parse_failure_leaves_file_unchanged() {
        let source = "await percySnapshot(page, 'Home';\n";
        let out = js(source, Platform::Percy, Framework::Playwright);
        assert_eq!(out.content, source);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].message.contains("could not be parsed"));
        assert_eq!(out.snapshot_count, 0);
        assert!(out.parse_failed);
    }

    #[test]
    fn test_cypress_commands() {
        let source = "\
import '@percy/cypress';
it('home', () => {
  cy.visit('/');
  cy.percySnapshot('Home', { scope: '.main' });
});
";
        let out = js(source, Platform::Percy, Framework::Cypress);
        insta::assert_snapshot!(out.content, @r"
        import '@lambdatest/cypress-driver';
        it('home', () => {
          cy.visit('/');
          cy.smartuiSnapshot('Home', { element: { cssSelector: '.main' } });
        });
        ");
    }

    #[test]
    fn test_python_percy() {
        let source = "\
from percy import percy_snapshot

def test_home(driver):
    driver.get(URL)
    percy_snapshot(driver, 'Home', ignore_region_selectors=['.ad'], widths=[375])
";
        let out = transform(SourceLanguage::Python, source, Platform::Percy, Framework::Selenium);
        insta::assert_snapshot!(out.content, @r#"
        from lambdatest_selenium_driver import smartui_snapshot

        def test_home(driver):
            driver.get(URL)
            smartui_snapshot(driver, 'Home', {"ignoreDOM": {"cssSelector": ['.ad']}})
        "#);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_python_applitools_fluent() {
        let source = "\
from applitools.selenium import Eyes, Target

def test_home(driver):
    eyes = Eyes()
    eyes.open(driver, 'App', 'Home')
    eyes.check('Home', Target.window().fully().ignore('.ad'))
    eyes.close()
";
        let out = transform(
            SourceLanguage::Python,
            source,
            Platform::Applitools,
            Framework::Selenium,
        );
        insta::assert_snapshot!(out.content, @r#"
        from lambdatest_selenium_driver import smartui_snapshot

        def test_home(driver):
            smartui_snapshot(driver, 'Home', {"ignoreDOM": {"cssSelector": ['.ad']}, "fullPage": True})
        "#);
        assert_eq!(out.snapshot_count, 1);
        assert!(!out.warnings.iter().any(|w| w.message.contains("declaration")));
    }

    #[test]
    fn test_java_applitools() {
        let source = "\
import com.applitools.eyes.selenium.Eyes;
import com.applitools.eyes.selenium.fluent.Target;

class HomeTest {
    void home() {
        eyes.open(driver, \"App\", \"Home\");
        eyes.check(Target.window().fully().withName(\"Home\"));
        eyes.closeAsync();
    }
}
";
        let out = transform(SourceLanguage::Java, source, Platform::Applitools, Framework::Selenium);
        insta::assert_snapshot!(out.content, @r#"
        import io.github.lambdatest.SmartUISnapshot;

        class HomeTest {
            void home() {
                SmartUISnapshot.smartuiSnapshot(driver, "Home", java.util.Map.of("fullPage", true));
            }
        }
        "#);
        assert!(out.warnings.iter().any(|w| w.message.contains("assumed driver")));
    }

    #[test]
    fn test_constructed_instance_under_any_name() {
        let source = "\
const { Eyes, Target } = require('@applitools/eyes-playwright');
const checker = new Eyes();
await checker.open(page, 'App', 'Home');
await checker.check('Home', Target.window());
await checker.close();
";
        let out = js(source, Platform::Applitools, Framework::Playwright);
        insta::assert_snapshot!(out.content, @r"
        const { smartuiSnapshot } = require('@lambdatest/playwright-driver');
        await smartuiSnapshot(page, 'Home');
        ");
        assert_eq!(out.snapshot_count, 1);
        assert!(!out.warnings.iter().any(|w| w.message.contains("still referenced")));
    }

    #[test]
    fn test_python_constructed_client() {
        let source = "\
from saucelabs_visual.client import SauceLabsVisual

def test_home(driver):
    sauce = SauceLabsVisual()
    sauce.create_build('Build')
    sauce.create_snapshot_from_webdriver('Home', driver)
    sauce.finish_build()
";
        let out = transform(SourceLanguage::Python, source, Platform::SauceLabs, Framework::Selenium);
        assert_eq!(out.snapshot_count, 1);
        assert!(!out.content.contains("sauce"), "{}", out.content);
        assert!(out.content.contains("smartui_snapshot(driver, 'Home')"));
        assert!(!out.warnings.iter().any(|w| w.message.contains("still referenced")));
    }

    #[test]
    fn test_java_constructed_instance() {
        let source = "\
import com.applitools.eyes.selenium.Eyes;

class HomeTest {
    void home() {
        Eyes checker = new Eyes();
        checker.open(driver, \"App\", \"Home\");
        checker.checkWindow(\"Home\");
        checker.closeAsync();
    }
}
";
        let out = transform(SourceLanguage::Java, source, Platform::Applitools, Framework::Selenium);
        insta::assert_snapshot!(out.content, @r#"
        import io.github.lambdatest.SmartUISnapshot;

        class HomeTest {
            void home() {
                SmartUISnapshot.smartuiSnapshot(driver, "Home");
            }
        }
        "#);
        assert_eq!(out.snapshot_count, 1);
    }

    #[test]
    fn test_remaining_references_are_reported() {
        let source = "\
const { Eyes, Target } = require('@applitools/eyes-playwright');
const checker = new Eyes();
const full = Target.window().fully();
report(checker);
";
        let out = js(source, Platform::Applitools, Framework::Playwright);
        assert!(out.content.contains("report(checker);"));
        let messages: Vec<&str> = out.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "`Target` is still referenced but it is no longer imported",
                "`checker` is still referenced but its declaration was removed",
            ]
        );
        assert_eq!(out.warnings[0].line, Some(1));
        assert_eq!(out.warnings[1].line, Some(2));
    }

    #[test]
    fn test_default_import_keeps_its_local_name() {
        let source = "\
import takeSnapshot from '@percy/playwright';
test('home', async ({ page }) => {
  await takeSnapshot(page, 'Home');
  await takeSnapshot(page, 'Wide', { widths: [1280] });
});
";
        let out = js(source, Platform::Percy, Framework::Playwright);
        insta::assert_snapshot!(out.content, @r"
        import { smartuiSnapshot as takeSnapshot } from '@lambdatest/playwright-driver';
        test('home', async ({ page }) => {
          await takeSnapshot(page, 'Home');
          await takeSnapshot(page, 'Wide');
        });
        ");
        assert_eq!(out.snapshot_count, 2);
        assert_eq!(out.warnings.len(), 1);

        let again = js(&out.content, Platform::Percy, Framework::Playwright);
        assert_eq!(again.content, out.content);
        assert!(again.changes.is_empty());
    }

    #[test]
    fn test_renamed_imports_keep_their_alias() {
        let source = "\
import { percySnapshot as snap } from '@percy/playwright';
await snap(page, 'Home');
";
        let out = js(source, Platform::Percy, Framework::Playwright);
        insta::assert_snapshot!(out.content, @r"
        import { smartuiSnapshot as snap } from '@lambdatest/playwright-driver';
        await snap(page, 'Home');
        ");
        assert_eq!(out.snapshot_count, 1);

        let source = "\
from percy import percy_snapshot as snap

def test_home(driver):
    snap(driver, 'Home')
";
        let out = transform(SourceLanguage::Python, source, Platform::Percy, Framework::Selenium);
        insta::assert_snapshot!(out.content, @r"
        from lambdatest_selenium_driver import smartui_snapshot as snap

        def test_home(driver):
            snap(driver, 'Home')
        ");
        assert_eq!(out.snapshot_count, 1);
        assert!(out.warnings.is_empty());
    }
}
