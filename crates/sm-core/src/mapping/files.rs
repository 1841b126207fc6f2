//! File-name tables: platform configuration, framework markers, CI pipelines
//! and dependency manifests.
//!
//! Glob patterns are relative to the project root and use `globset` syntax.

use crate::types::{Framework, Language, Platform};

/// A platform configuration file pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigFilePattern {
    /// Platform the file configures.
    pub platform: Platform,
    /// Glob relative to the project root.
    pub glob: &'static str,
}

const fn cfg(platform: Platform, glob: &'static str) -> ConfigFilePattern {
    ConfigFilePattern { platform, glob }
}

/// Every platform configuration file pattern.
pub static PLATFORM_CONFIG_FILES: &[ConfigFilePattern] = &[
    cfg(Platform::Percy, "**/.percy.yml"),
    cfg(Platform::Percy, "**/.percy.yaml"),
    cfg(Platform::Percy, "**/.percy.json"),
    cfg(Platform::Percy, "**/.percy.js"),
    cfg(Platform::Percy, "**/percy.config.js"),
    cfg(Platform::Applitools, "**/applitools.config.js"),
    cfg(Platform::Applitools, "**/applitools.config.ts"),
    cfg(Platform::Applitools, "**/applitools.config.cjs"),
    cfg(Platform::SauceLabs, "**/.sauce/config.yml"),
    cfg(Platform::SauceLabs, "**/sauce-visual.config.js"),
];

/// Configuration file globs for one platform.
pub fn config_globs(platform: Platform) -> impl Iterator<Item = &'static str> {
    PLATFORM_CONFIG_FILES
        .iter()
        .filter(move |c| c.platform == platform)
        .map(|c| c.glob)
}

/// A structural signal for a framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureMarker {
    /// A file matching this glob exists.
    File(&'static str),
    /// A directory with this root-relative path exists.
    Dir(&'static str),
}

/// A framework and the marker that evidences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameworkMarker {
    /// Framework evidenced.
    pub framework: Framework,
    /// Signal.
    pub marker: StructureMarker,
}

const fn file(framework: Framework, glob: &'static str) -> FrameworkMarker {
    FrameworkMarker {
        framework,
        marker: StructureMarker::File(glob),
    }
}

const fn dir(framework: Framework, path: &'static str) -> FrameworkMarker {
    FrameworkMarker {
        framework,
        marker: StructureMarker::Dir(path),
    }
}

/// Framework markers in priority order.
pub static FRAMEWORK_MARKERS: &[FrameworkMarker] = &[
    dir(Framework::Storybook, ".storybook"),
    file(Framework::Cypress, "cypress.config.{js,ts,mjs,cjs}"),
    file(Framework::Cypress, "cypress.json"),
    dir(Framework::Cypress, "cypress"),
    file(Framework::Playwright, "playwright.config.{js,ts,mjs,cjs}"),
    file(Framework::WebdriverIO, "wdio.conf.{js,ts,mjs,cjs}"),
    file(Framework::WebdriverIO, "wdio.*.conf.{js,ts}"),
];

/// CI pipeline definitions.
pub static CI_GLOBS: &[&str] = &[
    ".github/workflows/*.{yml,yaml}",
    ".gitlab-ci.yml",
    ".circleci/config.yml",
    "azure-pipelines.yml",
    "bitbucket-pipelines.yml",
    ".travis.yml",
    "Jenkinsfile",
];

/// Dependency manifest file names for an ecosystem, in read order.
#[must_use]
pub const fn manifest_names(language: Language) -> &'static [&'static str] {
    match language {
        Language::JavaScript => &["package.json"],
        Language::Python => &["requirements.txt", "requirements-dev.txt", "pyproject.toml"],
        Language::Java => &["pom.xml", "build.gradle", "build.gradle.kts"],
    }
}

/// Manifest globs (any depth) for an ecosystem.
pub fn manifest_globs(language: Language) -> impl Iterator<Item = String> {
    manifest_names(language).iter().map(|name| format!("**/{name}"))
}

/// Source globs for an ecosystem.
///
/// # Examples
///
/// ```
/// use sm_core::Language;
/// use sm_core::mapping::files::source_globs;
///
/// assert_eq!(source_globs(Language::Python), vec!["**/*.py"]);
/// ```
#[must_use]
pub fn source_globs(language: Language) -> Vec<String> {
    language
        .extensions()
        .iter()
        .map(|ext| format!("**/*.{ext}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_platform_has_config_files() {
        for platform in Platform::ALL {
            assert!(config_globs(platform).next().is_some(), "{platform}");
        }
    }

    #[test]
    fn test_manifest_globs() {
        let globs: Vec<String> = manifest_globs(Language::Java).collect();
        assert_eq!(globs, vec!["**/pom.xml", "**/build.gradle", "**/build.gradle.kts"]);
    }
}
