//! Module references and the SmartUI module each becomes.
//!
//! JavaScript entries are module specifiers, Python entries are dotted module
//! names from `from X import ...`, and Java entries are packages (the import
//! minus its final class segment). Matching is exact.

use crate::types::{Framework, Language, Platform};

use super::target::TARGET_JAVA_IMPORT;

/// The module a source reference is rewritten to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleTarget {
    /// Always the same module.
    Fixed(&'static str),
    /// Depends on the detected framework.
    ByFramework {
        /// Used when no override matches.
        default: &'static str,
        /// Framework-specific modules.
        overrides: &'static [(Framework, &'static str)],
    },
}

impl ModuleTarget {
    /// Resolves the module for `framework`.
    #[must_use]
    pub fn resolve(self, framework: Framework) -> &'static str {
        match self {
            Self::Fixed(module) => module,
            Self::ByFramework { default, overrides } => overrides
                .iter()
                .find(|(f, _)| *f == framework)
                .map_or(default, |(_, module)| module),
        }
    }
}

/// One module rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleRule {
    /// Platform the module belongs to.
    pub platform: Platform,
    /// Language of the reference.
    pub language: Language,
    /// Exact module reference.
    pub module: &'static str,
    /// Replacement.
    pub target: ModuleTarget,
}

const fn rule(
    platform: Platform,
    language: Language,
    module: &'static str,
    target: ModuleTarget,
) -> ModuleRule {
    ModuleRule {
        platform,
        language,
        module,
        target,
    }
}

use Language as L;
use ModuleTarget::{ByFramework, Fixed};
use Platform as P;

const JS_CYPRESS: ModuleTarget = Fixed("@lambdatest/cypress-driver");
const JS_PLAYWRIGHT: ModuleTarget = Fixed("@lambdatest/playwright-driver");
const JS_SELENIUM: ModuleTarget = Fixed("@lambdatest/selenium-driver");
const JS_WDIO: ModuleTarget = Fixed("@lambdatest/webdriverio-driver");
const JS_PUPPETEER: ModuleTarget = Fixed("@lambdatest/puppeteer-driver");
const JS_BY_FRAMEWORK: ModuleTarget = ByFramework {
    default: "@lambdatest/selenium-driver",
    overrides: &[
        (Framework::Cypress, "@lambdatest/cypress-driver"),
        (Framework::Playwright, "@lambdatest/playwright-driver"),
        (Framework::WebdriverIO, "@lambdatest/webdriverio-driver"),
        (Framework::Puppeteer, "@lambdatest/puppeteer-driver"),
    ],
};
const PY_BY_FRAMEWORK: ModuleTarget = ByFramework {
    default: "lambdatest_selenium_driver",
    overrides: &[(Framework::Playwright, "lambdatest_playwright_driver")],
};
const PY_PLAYWRIGHT: ModuleTarget = Fixed("lambdatest_playwright_driver");
const PY_SELENIUM: ModuleTarget = Fixed("lambdatest_selenium_driver");
const JAVA: ModuleTarget = Fixed(TARGET_JAVA_IMPORT);

/// Every known module rewrite.
pub static MODULE_RULES: &[ModuleRule] = &[
    rule(P::Percy, L::JavaScript, "@percy/cypress", JS_CYPRESS),
    rule(P::Percy, L::JavaScript, "@percy/playwright", JS_PLAYWRIGHT),
    rule(P::Percy, L::JavaScript, "@percy/selenium-webdriver", JS_SELENIUM),
    rule(P::Percy, L::JavaScript, "@percy/webdriverio", JS_WDIO),
    rule(P::Percy, L::JavaScript, "@percy/puppeteer", JS_PUPPETEER),
    rule(P::Percy, L::Python, "percy", PY_BY_FRAMEWORK),
    rule(P::Percy, L::Python, "percy.snapshot", PY_BY_FRAMEWORK),
    rule(P::Percy, L::Java, "io.percy.selenium", JAVA),
    rule(P::Percy, L::Java, "io.percy.playwright", JAVA),
    rule(P::Percy, L::Java, "io.percy.appium", JAVA),
    rule(P::Applitools, L::JavaScript, "@applitools/eyes-cypress", JS_CYPRESS),
    rule(P::Applitools, L::JavaScript, "@applitools/eyes-cypress/commands", JS_CYPRESS),
    rule(P::Applitools, L::JavaScript, "@applitools/eyes-playwright", JS_PLAYWRIGHT),
    rule(P::Applitools, L::JavaScript, "@applitools/eyes-playwright/fixture", JS_PLAYWRIGHT),
    rule(P::Applitools, L::JavaScript, "@applitools/eyes-selenium", JS_SELENIUM),
    rule(P::Applitools, L::JavaScript, "@applitools/eyes-webdriverio", JS_WDIO),
    rule(P::Applitools, L::JavaScript, "@applitools/eyes-puppeteer", JS_PUPPETEER),
    rule(P::Applitools, L::Python, "applitools.selenium", PY_SELENIUM),
    rule(P::Applitools, L::Python, "applitools.selenium.fluent", PY_SELENIUM),
    rule(P::Applitools, L::Python, "applitools.playwright", PY_PLAYWRIGHT),
    rule(P::Applitools, L::Python, "applitools.common", PY_BY_FRAMEWORK),
    rule(P::Applitools, L::Java, "com.applitools.eyes", JAVA),
    rule(P::Applitools, L::Java, "com.applitools.eyes.config", JAVA),
    rule(P::Applitools, L::Java, "com.applitools.eyes.selenium", JAVA),
    rule(P::Applitools, L::Java, "com.applitools.eyes.selenium.fluent", JAVA),
    rule(P::Applitools, L::Java, "com.applitools.eyes.playwright", JAVA),
    rule(P::Applitools, L::Java, "com.applitools.eyes.playwright.fluent", JAVA),
    rule(P::Applitools, L::Java, "com.applitools.eyes.appium", JAVA),
    rule(P::Applitools, L::Java, "com.applitools.eyes.visualgrid.services", JAVA),
    rule(P::SauceLabs, L::JavaScript, "@saucelabs/visual", JS_BY_FRAMEWORK),
    rule(P::SauceLabs, L::JavaScript, "@saucelabs/cypress-visual-plugin", JS_CYPRESS),
    rule(P::SauceLabs, L::JavaScript, "@saucelabs/visual-playwright", JS_PLAYWRIGHT),
    rule(P::SauceLabs, L::JavaScript, "@saucelabs/wdio-sauce-visual-service", JS_WDIO),
    rule(P::SauceLabs, L::Python, "saucelabs_visual", PY_BY_FRAMEWORK),
    rule(P::SauceLabs, L::Python, "saucelabs_visual.client", PY_BY_FRAMEWORK),
    rule(P::SauceLabs, L::Python, "saucelabs_visual.regions", PY_BY_FRAMEWORK),
    rule(P::SauceLabs, L::Java, "com.saucelabs.visual", JAVA),
    rule(P::SauceLabs, L::Java, "com.saucelabs.visual.model", JAVA),
];

/// Finds the rewrite for a module reference.
///
/// # Examples
///
/// ```
/// use sm_core::{Framework, Language, Platform};
/// use sm_core::mapping::modules::module_rule;
///
/// let rule = module_rule(Platform::Percy, Language::Python, "percy");
/// assert_eq!(
///     rule.map(|r| r.target.resolve(Framework::Playwright)),
///     Some("lambdatest_playwright_driver")
/// );
/// assert!(module_rule(Platform::Percy, Language::Python, "percyx").is_none());
/// ```
#[must_use]
pub fn module_rule(platform: Platform, language: Language, module: &str) -> Option<&'static ModuleRule> {
    MODULE_RULES
        .iter()
        .find(|r| r.platform == platform && r.language == language && r.module == module)
}
