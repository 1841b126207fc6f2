//! Dependency names that identify a platform or a framework.

use std::borrow::Cow;

use crate::types::{Framework, Language, Platform};

/// A dependency that evidences a source platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformDependency {
    /// Platform evidenced.
    pub platform: Platform,
    /// Ecosystem the name belongs to.
    pub language: Language,
    /// Package name; Java entries are `groupId:artifactId`.
    pub name: &'static str,
    /// Framework implied by the SDK flavour, if any.
    pub framework: Option<Framework>,
    /// SmartUI package that replaces it.
    pub target: &'static str,
}

const fn dep(
    platform: Platform,
    language: Language,
    name: &'static str,
    framework: Option<Framework>,
    target: &'static str,
) -> PlatformDependency {
    PlatformDependency {
        platform,
        language,
        name,
        framework,
        target,
    }
}

use Framework as F;
use Language as L;
use Platform as P;

const JS_CLI: &str = "@lambdatest/smartui-cli";
const JS_CYPRESS: &str = "@lambdatest/cypress-driver";
const JS_PLAYWRIGHT: &str = "@lambdatest/playwright-driver";
const JS_SELENIUM: &str = "@lambdatest/selenium-driver";
const JS_WDIO: &str = "@lambdatest/webdriverio-driver";
const JS_PUPPETEER: &str = "@lambdatest/puppeteer-driver";
const PY_SELENIUM: &str = "lambdatest-selenium-driver";
const PY_PLAYWRIGHT: &str = "lambdatest-playwright-driver";
const JAVA_SDK: &str = "io.github.lambdatest:lambdatest-java-sdk";

/// Every known platform dependency.
pub static PLATFORM_DEPENDENCIES: &[PlatformDependency] = &[
    // Percy
    dep(P::Percy, L::JavaScript, "@percy/cli", None, JS_CLI),
    dep(P::Percy, L::JavaScript, "@percy/cypress", Some(F::Cypress), JS_CYPRESS),
    dep(P::Percy, L::JavaScript, "@percy/playwright", Some(F::Playwright), JS_PLAYWRIGHT),
    dep(P::Percy, L::JavaScript, "@percy/selenium-webdriver", Some(F::Selenium), JS_SELENIUM),
    dep(P::Percy, L::JavaScript, "@percy/webdriverio", Some(F::WebdriverIO), JS_WDIO),
    dep(P::Percy, L::JavaScript, "@percy/puppeteer", Some(F::Puppeteer), JS_PUPPETEER),
    dep(P::Percy, L::JavaScript, "@percy/storybook", Some(F::Storybook), JS_CLI),
    dep(P::Percy, L::JavaScript, "@percy/appium-app", Some(F::Appium), JS_WDIO),
    dep(P::Percy, L::Python, "percy-selenium", Some(F::Selenium), PY_SELENIUM),
    dep(P::Percy, L::Python, "percy-playwright", Some(F::Playwright), PY_PLAYWRIGHT),
    dep(P::Percy, L::Python, "percy-appium-app", Some(F::Appium), PY_SELENIUM),
    dep(P::Percy, L::Java, "io.percy:percy-java-selenium", Some(F::Selenium), JAVA_SDK),
    dep(P::Percy, L::Java, "io.percy:percy-playwright-java", Some(F::Playwright), JAVA_SDK),
    dep(P::Percy, L::Java, "io.percy:percy-appium-app", Some(F::Appium), JAVA_SDK),
    // Applitools
    dep(P::Applitools, L::JavaScript, "@applitools/eyes-cypress", Some(F::Cypress), JS_CYPRESS),
    dep(P::Applitools, L::JavaScript, "@applitools/eyes-playwright", Some(F::Playwright), JS_PLAYWRIGHT),
    dep(P::Applitools, L::JavaScript, "@applitools/eyes-selenium", Some(F::Selenium), JS_SELENIUM),
    dep(P::Applitools, L::JavaScript, "@applitools/eyes-webdriverio", Some(F::WebdriverIO), JS_WDIO),
    dep(P::Applitools, L::JavaScript, "@applitools/eyes-puppeteer", Some(F::Puppeteer), JS_PUPPETEER),
    dep(P::Applitools, L::JavaScript, "@applitools/eyes-storybook", Some(F::Storybook), JS_CLI),
    dep(P::Applitools, L::Python, "eyes-selenium", Some(F::Selenium), PY_SELENIUM),
    dep(P::Applitools, L::Python, "eyes-playwright", Some(F::Playwright), PY_PLAYWRIGHT),
    dep(P::Applitools, L::Python, "eyes-robotframework", Some(F::Selenium), PY_SELENIUM),
    dep(P::Applitools, L::Java, "com.applitools:eyes-selenium-java5", Some(F::Selenium), JAVA_SDK),
    dep(P::Applitools, L::Java, "com.applitools:eyes-playwright-java5", Some(F::Playwright), JAVA_SDK),
    dep(P::Applitools, L::Java, "com.applitools:eyes-appium-java5", Some(F::Appium), JAVA_SDK),
    // Sauce Labs Visual
    dep(P::SauceLabs, L::JavaScript, "@saucelabs/visual", None, JS_CLI),
    dep(P::SauceLabs, L::JavaScript, "@saucelabs/cypress-visual-plugin", Some(F::Cypress), JS_CYPRESS),
    dep(P::SauceLabs, L::JavaScript, "@saucelabs/visual-playwright", Some(F::Playwright), JS_PLAYWRIGHT),
    dep(P::SauceLabs, L::JavaScript, "@saucelabs/wdio-sauce-visual-service", Some(F::WebdriverIO), JS_WDIO),
    dep(P::SauceLabs, L::Python, "saucelabs-visual", None, PY_SELENIUM),
    dep(P::SauceLabs, L::Java, "com.saucelabs.visual:java-client", None, JAVA_SDK),
];

/// How a framework dependency name is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern {
    /// The whole name.
    Exact(&'static str),
    /// Any name starting with the prefix (`@storybook/`).
    Prefix(&'static str),
}

impl NamePattern {
    /// Tests a normalized dependency name.
    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => name == exact,
            Self::Prefix(prefix) => name.starts_with(prefix),
        }
    }
}

/// A dependency that evidences a test framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameworkDependency {
    /// Ecosystem the name belongs to.
    pub language: Language,
    /// Name or prefix.
    pub pattern: NamePattern,
    /// Framework evidenced.
    pub framework: Framework,
}

const fn fw(language: Language, pattern: NamePattern, framework: Framework) -> FrameworkDependency {
    FrameworkDependency {
        language,
        pattern,
        framework,
    }
}

use NamePattern::{Exact, Prefix};

/// Framework dependencies in priority order: the first entry matched by any
/// declared dependency wins.
pub static FRAMEWORK_DEPENDENCIES: &[FrameworkDependency] = &[
    fw(L::JavaScript, Exact("storybook"), F::Storybook),
    fw(L::JavaScript, Prefix("@storybook/"), F::Storybook),
    fw(L::JavaScript, Exact("appium"), F::Appium),
    fw(L::JavaScript, Exact("cypress"), F::Cypress),
    fw(L::JavaScript, Exact("@playwright/test"), F::Playwright),
    fw(L::JavaScript, Exact("playwright"), F::Playwright),
    fw(L::JavaScript, Exact("webdriverio"), F::WebdriverIO),
    fw(L::JavaScript, Prefix("@wdio/"), F::WebdriverIO),
    fw(L::JavaScript, Exact("puppeteer"), F::Puppeteer),
    fw(L::JavaScript, Exact("selenium-webdriver"), F::Selenium),
    fw(L::Python, Exact("appium-python-client"), F::Appium),
    fw(L::Python, Exact("pytest-playwright"), F::Playwright),
    fw(L::Python, Exact("playwright"), F::Playwright),
    fw(L::Python, Exact("selenium"), F::Selenium),
    fw(L::Java, Prefix("io.appium:"), F::Appium),
    fw(L::Java, Prefix("com.microsoft.playwright:"), F::Playwright),
    fw(L::Java, Prefix("org.seleniumhq.selenium:"), F::Selenium),
];

/// Normalizes a declared dependency name for comparison.
///
/// Python names follow PEP 503 (case-insensitive, `_` and `.` equal to `-`);
/// other ecosystems compare exactly.
#[must_use]
pub fn normalize_name(language: Language, name: &str) -> Cow<'_, str> {
    match language {
        Language::Python => Cow::Owned(
            name.trim()
                .chars()
                .map(|c| match c {
                    '_' | '.' => '-',
                    other => other.to_ascii_lowercase(),
                })
                .collect(),
        ),
        Language::JavaScript | Language::Java => Cow::Borrowed(name.trim()),
    }
}

/// Finds the platform entry for a declared dependency.
///
/// # Examples
///
/// ```
/// use sm_core::{Language, Platform};
/// use sm_core::mapping::dependencies::platform_dependency;
///
/// let entry = platform_dependency(Language::Python, "Percy_Selenium").map(|d| d.platform);
/// assert_eq!(entry, Some(Platform::Percy));
/// assert!(platform_dependency(Language::JavaScript, "cypress").is_none());
/// ```
#[must_use]
pub fn platform_dependency(language: Language, name: &str) -> Option<&'static PlatformDependency> {
    let normalized = normalize_name(language, name);
    PLATFORM_DEPENDENCIES
        .iter()
        .find(|d| d.language == language && d.name == normalized)
}

/// Picks the framework evidenced by a set of declared dependencies.
#[must_use]
pub fn framework_from_dependencies<S: AsRef<str>>(language: Language, names: &[S]) -> Option<Framework> {
    let normalized: Vec<Cow<'_, str>> = names
        .iter()
        .map(|n| normalize_name(language, n.as_ref()))
        .collect();
    FRAMEWORK_DEPENDENCIES
        .iter()
        .filter(|f| f.language == language)
        .find(|f| normalized.iter().any(|n| f.pattern.matches(n)))
        .map(|f| f.framework)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_platform_has_dependencies_in_every_language() {
        for platform in Platform::ALL {
            for language in Language::ALL {
                assert!(
                    PLATFORM_DEPENDENCIES
                        .iter()
                        .any(|d| d.platform == platform && d.language == language),
                    "{platform} has no {language} dependency"
                );
            }
        }
    }

    #[test]
    fn test_targets_never_evidence_a_platform() {
        for entry in PLATFORM_DEPENDENCIES {
            assert!(platform_dependency(entry.language, entry.target).is_none());
        }
    }

    #[test]
    fn test_framework_priority() {
        let names = ["@playwright/test", "@storybook/react"];
        assert_eq!(
            framework_from_dependencies(Language::JavaScript, &names),
            Some(Framework::Storybook)
        );
        let names = ["selenium", "Appium-Python-Client"];
        assert_eq!(
            framework_from_dependencies(Language::Python, &names),
            Some(Framework::Appium)
        );
        let names = ["org.seleniumhq.selenium:selenium-java"];
        assert_eq!(
            framework_from_dependencies(Language::Java, &names),
            Some(Framework::Selenium)
        );
        let names: [&str; 0] = [];
        assert_eq!(framework_from_dependencies(Language::Java, &names), None);
    }

    #[test]
    fn test_python_normalization() {
        assert_eq!(normalize_name(Language::Python, "Eyes_Selenium"), "eyes-selenium");
        assert_eq!(normalize_name(Language::JavaScript, " @percy/cli "), "@percy/cli");
    }
}
