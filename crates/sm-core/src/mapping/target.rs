//! SmartUI names, generated artifacts and CI substitutions.

use crate::types::Platform;

/// SmartUI snapshot function (camelCase; Python uses its snake_case form).
pub const TARGET_SNAPSHOT_FN: &str = "smartuiSnapshot";

/// Java class hosting the snapshot method.
pub const TARGET_JAVA_CLASS: &str = "SmartUISnapshot";

/// Fully-qualified Java import for [`TARGET_JAVA_CLASS`].
pub const TARGET_JAVA_IMPORT: &str = "io.github.lambdatest.SmartUISnapshot";

/// Generated SmartUI project configuration.
pub const TARGET_CONFIG_FILE: &str = ".smartui.json";

/// Environment variable holding the SmartUI project token.
pub const TARGET_TOKEN_ENV: &str = "PROJECT_TOKEN";

/// A keyed text substitution applied to CI pipeline definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CiSubstitution {
    /// Platform the substitution belongs to.
    pub platform: Platform,
    /// Text to find.
    pub from: &'static str,
    /// Replacement.
    pub to: &'static str,
}

const fn sub(platform: Platform, from: &'static str, to: &'static str) -> CiSubstitution {
    CiSubstitution { platform, from, to }
}

/// CI substitutions in application order. Longer patterns come first so a
/// shorter one never rewrites part of an earlier replacement.
pub static CI_SUBSTITUTIONS: &[CiSubstitution] = &[
    sub(Platform::Percy, "npx percy exec --", "npx smartui exec --"),
    sub(Platform::Percy, "percy exec --", "npx smartui exec --"),
    sub(Platform::Percy, "npx percy storybook", "npx smartui storybook"),
    sub(Platform::Percy, "PERCY_TOKEN", TARGET_TOKEN_ENV),
    sub(Platform::Applitools, "APPLITOOLS_API_KEY", TARGET_TOKEN_ENV),
    sub(Platform::Applitools, "npx eyes-storybook", "npx smartui storybook"),
    sub(Platform::SauceLabs, "SAUCE_USERNAME", "LT_USERNAME"),
    sub(Platform::SauceLabs, "SAUCE_ACCESS_KEY", "LT_ACCESS_KEY"),
];

/// Substitutions for one platform, in application order.
pub fn ci_substitutions(platform: Platform) -> impl Iterator<Item = &'static CiSubstitution> {
    CI_SUBSTITUTIONS.iter().filter(move |s| s.platform == platform)
}

/// Applies every substitution for `platform` to `text`.
///
/// Returns `None` when nothing changed.
///
/// # Examples
///
/// ```
/// use sm_core::Platform;
/// use sm_core::mapping::target::substitute_ci;
///
/// let out = substitute_ci(Platform::Percy, "run: npx percy exec -- cypress run");
/// assert_eq!(out.as_deref(), Some("run: npx smartui exec -- cypress run"));
/// assert!(substitute_ci(Platform::Percy, "run: npm test").is_none());
/// ```
#[must_use]
pub fn substitute_ci(platform: Platform, text: &str) -> Option<String> {
    let mut out = text.to_owned();
    for s in ci_substitutions(platform) {
        if out.contains(s.from) {
            out = out.replace(s.from, s.to);
        }
    }
    (out != text).then_some(out)
}
