//! Closed enumerations describing what a project is built with.
//!
//! A migration run is parameterized by exactly one [`Platform`] (the visual
//! testing vendor being migrated away from), one [`Framework`], and one
//! [`Language`]. The [`TestType`] is never detected on its own; it is derived
//! from the framework.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A source visual-testing platform that can be migrated to SmartUI.
///
/// # Examples
///
/// ```
/// use sm_core::Platform;
///
/// assert_eq!(Platform::Percy.label(), "Percy");
/// assert_eq!(Platform::ALL.len(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// BrowserStack Percy.
    Percy,
    /// Applitools Eyes.
    Applitools,
    /// Sauce Labs Visual.
    SauceLabs,
}

impl Platform {
    /// Every supported source platform, in detection priority order.
    pub const ALL: [Self; 3] = [Self::Percy, Self::Applitools, Self::SauceLabs];

    /// Returns a human-readable label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Percy => "Percy",
            Self::Applitools => "Applitools",
            Self::SauceLabs => "Sauce Labs Visual",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The test-runner context a project uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    /// Cypress component and end-to-end tests.
    Cypress,
    /// Playwright test runner or library.
    Playwright,
    /// Selenium WebDriver bindings.
    Selenium,
    /// WebdriverIO.
    WebdriverIO,
    /// Puppeteer.
    Puppeteer,
    /// Storybook stories rendered as snapshots.
    Storybook,
    /// Appium native app driver.
    Appium,
}

impl Framework {
    /// Derives the test type for this framework.
    ///
    /// # Examples
    ///
    /// ```
    /// use sm_core::{Framework, TestType};
    ///
    /// assert_eq!(Framework::Storybook.test_type(), TestType::Storybook);
    /// assert_eq!(Framework::Appium.test_type(), TestType::Appium);
    /// assert_eq!(Framework::Cypress.test_type(), TestType::E2e);
    /// ```
    #[inline]
    #[must_use]
    pub const fn test_type(self) -> TestType {
        match self {
            Self::Storybook => TestType::Storybook,
            Self::Appium => TestType::Appium,
            Self::Cypress
            | Self::Playwright
            | Self::Selenium
            | Self::WebdriverIO
            | Self::Puppeteer => TestType::E2e,
        }
    }

    /// The framework assumed when a project gives no structural signal.
    #[inline]
    #[must_use]
    pub const fn default_for(language: Language) -> Self {
        match language {
            Language::JavaScript => Self::Playwright,
            Language::Python | Language::Java => Self::Selenium,
        }
    }

    /// The identifier conventionally bound to the browser or app driver.
    ///
    /// Used when a source call carries no driver argument but the SmartUI
    /// equivalent requires one.
    #[inline]
    #[must_use]
    pub const fn driver_identifier(self) -> &'static str {
        match self {
            Self::Playwright | Self::Puppeteer | Self::Storybook => "page",
            Self::WebdriverIO => "browser",
            Self::Cypress => "cy",
            Self::Selenium | Self::Appium => "driver",
        }
    }

    /// Returns a human-readable label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cypress => "Cypress",
            Self::Playwright => "Playwright",
            Self::Selenium => "Selenium",
            Self::WebdriverIO => "WebdriverIO",
            Self::Puppeteer => "Puppeteer",
            Self::Storybook => "Storybook",
            Self::Appium => "Appium",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A supported language ecosystem.
///
/// `JavaScript` covers TypeScript as well; both share `package.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// JavaScript and TypeScript.
    JavaScript,
    /// Python.
    Python,
    /// Java.
    Java,
}

impl Language {
    /// Every supported ecosystem, in manifest analysis order.
    pub const ALL: [Self; 3] = [Self::JavaScript, Self::Python, Self::Java];

    /// Source file extensions belonging to this ecosystem.
    #[inline]
    #[must_use]
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::JavaScript => &["js", "jsx", "mjs", "cjs", "ts", "tsx"],
            Self::Python => &["py"],
            Self::Java => &["java"],
        }
    }

    /// Returns the ecosystem a file extension belongs to, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use sm_core::Language;
    ///
    /// assert_eq!(Language::from_extension("tsx"), Some(Language::JavaScript));
    /// assert_eq!(Language::from_extension("py"), Some(Language::Python));
    /// assert_eq!(Language::from_extension("rb"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|language| language.extensions().contains(&ext))
    }

    /// Returns a human-readable label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::JavaScript => "JavaScript/TypeScript",
            Self::Python => "Python",
            Self::Java => "Java",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The kind of visual test suite, derived from [`Framework::test_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    /// Browser end-to-end tests.
    #[default]
    E2e,
    /// Component stories rendered by Storybook.
    Storybook,
    /// Native mobile app tests.
    Appium,
}

/// How much a detection decision can be trusted.
///
/// Ordered from weakest to strongest so `max()` picks the best evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Inferred from project structure or a language default.
    Low,
    /// A platform configuration file was found.
    Medium,
    /// A dependency manifest declares the platform.
    High,
}
