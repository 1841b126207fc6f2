//! Option keys of source snapshot calls and the role each plays.
//!
//! The same table covers option records (`{ widths: [...] }`), Python keyword
//! arguments (`ignore_region_selectors=[...]`) and Applitools fluent
//! modifiers (`.layoutRegions(...)`); keys compare through
//! [`canonical`](super::canonical).

use crate::types::Platform;

use super::same_name;

/// What an option contributes to the SmartUI call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionRole {
    /// CSS selectors to ignore, mapped to `ignoreDOM.cssSelector`.
    IgnoreSelectors,
    /// XPath expressions to ignore, mapped to `ignoreDOM.xpath`.
    IgnoreXpaths,
    /// Selector limiting the snapshot, mapped to `element.cssSelector`.
    ScopeSelector,
    /// Full-page capture, mapped to `fullPage`.
    FullPage,
    /// The snapshot name.
    Name,
    /// Regions compared by layout only; requires emulation.
    LayoutRegions,
    /// A match level; the value `Layout` requires emulation.
    LayoutMatchLevel,
    /// Applitools `target: 'window' | 'region'`.
    RegionTarget,
    /// Session plumbing with no meaning in SmartUI; dropped silently.
    Discard,
    /// Dropped with a warning.
    Unsupported {
        /// Why fidelity is lost.
        reason: &'static str,
    },
}

/// One option key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionRule {
    /// Platform the key belongs to.
    pub platform: Platform,
    /// Key in camelCase.
    pub key: &'static str,
    /// Role.
    pub role: OptionRole,
}

const fn opt(platform: Platform, key: &'static str, role: OptionRole) -> OptionRule {
    OptionRule {
        platform,
        key,
        role,
    }
}

const fn unsupported(reason: &'static str) -> OptionRole {
    OptionRole::Unsupported { reason }
}

use OptionRole::{
    Discard, FullPage, IgnoreSelectors, IgnoreXpaths, LayoutMatchLevel, LayoutRegions, Name,
    RegionTarget, ScopeSelector,
};
use Platform as P;

const WIDTHS: &str = "SmartUI viewports are configured in .smartui.json";
const COORDINATES: &str = "coordinate-based regions have no SmartUI equivalent";
const ELEMENTS: &str = "element handles cannot be mapped statically; use selectors";
const TIMING: &str = "SmartUI capture timing is configured in .smartui.json";

/// Every known option key.
pub static OPTION_RULES: &[OptionRule] = &[
    // Percy
    opt(P::Percy, "name", Name),
    opt(P::Percy, "ignoreRegionSelectors", IgnoreSelectors),
    opt(P::Percy, "ignoreRegionXpaths", IgnoreXpaths),
    opt(P::Percy, "scope", ScopeSelector),
    opt(P::Percy, "fullPage", FullPage),
    opt(P::Percy, "widths", unsupported(WIDTHS)),
    opt(P::Percy, "minHeight", unsupported(WIDTHS)),
    opt(P::Percy, "percyCSS", unsupported("per-snapshot CSS injection is not supported")),
    opt(P::Percy, "enableJavaScript", unsupported("JavaScript is always enabled in SmartUI")),
    opt(P::Percy, "enableLayout", unsupported("layout comparison has no SmartUI equivalent")),
    opt(P::Percy, "sync", unsupported("SmartUI snapshots are always asynchronous")),
    opt(P::Percy, "discovery", unsupported("asset discovery settings are not supported")),
    opt(P::Percy, "domTransformation", unsupported("DOM transformation scripts are not supported")),
    opt(P::Percy, "responsiveSnapshotCapture", unsupported(WIDTHS)),
    opt(P::Percy, "ignoreRegionElements", unsupported(ELEMENTS)),
    opt(P::Percy, "ignoreRegionBoundingBoxes", unsupported(COORDINATES)),
    opt(P::Percy, "customIgnoreRegions", unsupported(COORDINATES)),
    opt(P::Percy, "considerRegionSelectors", unsupported("consider regions have no SmartUI equivalent")),
    // Applitools
    opt(P::Applitools, "tag", Name),
    opt(P::Applitools, "name", Name),
    opt(P::Applitools, "withName", Name),
    opt(P::Applitools, "fully", FullPage),
    opt(P::Applitools, "ignore", IgnoreSelectors),
    opt(P::Applitools, "ignoreRegions", IgnoreSelectors),
    opt(P::Applitools, "target", RegionTarget),
    opt(P::Applitools, "selector", ScopeSelector),
    opt(P::Applitools, "matchLevel", LayoutMatchLevel),
    opt(P::Applitools, "layout", LayoutRegions),
    opt(P::Applitools, "layoutRegions", LayoutRegions),
    opt(P::Applitools, "region", unsupported(COORDINATES)),
    opt(P::Applitools, "strict", unsupported("strict regions have no SmartUI equivalent")),
    opt(P::Applitools, "strictRegions", unsupported("strict regions have no SmartUI equivalent")),
    opt(P::Applitools, "content", unsupported("content regions have no SmartUI equivalent")),
    opt(P::Applitools, "contentRegions", unsupported("content regions have no SmartUI equivalent")),
    opt(P::Applitools, "floating", unsupported("floating regions have no SmartUI equivalent")),
    opt(P::Applitools, "floatingRegions", unsupported("floating regions have no SmartUI equivalent")),
    opt(P::Applitools, "accessibility", unsupported("accessibility regions are not supported")),
    opt(P::Applitools, "accessibilityRegions", unsupported("accessibility regions are not supported")),
    opt(P::Applitools, "sizeMode", unsupported("use fullPage instead")),
    opt(P::Applitools, "timeout", unsupported(TIMING)),
    opt(P::Applitools, "waitBeforeCapture", unsupported(TIMING)),
    opt(P::Applitools, "ignoreDisplacements", unsupported("displacement matching is not supported")),
    opt(P::Applitools, "sendDom", unsupported("DOM capture is not configurable per snapshot")),
    opt(P::Applitools, "scriptHooks", unsupported("script hooks are not supported")),
    opt(P::Applitools, "visualGridOptions", unsupported(WIDTHS)),
    // Sauce Labs Visual
    opt(P::SauceLabs, "name", Name),
    opt(P::SauceLabs, "ignore", IgnoreSelectors),
    opt(P::SauceLabs, "ignoreElements", IgnoreSelectors),
    opt(P::SauceLabs, "clipSelector", ScopeSelector),
    opt(P::SauceLabs, "fullPage", FullPage),
    opt(P::SauceLabs, "captureDom", unsupported("DOM capture is not configurable per snapshot")),
    opt(P::SauceLabs, "diffingMethod", unsupported("SmartUI uses a single diffing engine")),
    opt(P::SauceLabs, "diffingOptions", unsupported("SmartUI uses a single diffing engine")),
    opt(P::SauceLabs, "ignoreRegions", unsupported(COORDINATES)),
    opt(P::SauceLabs, "clipElement", unsupported(ELEMENTS)),
    opt(P::SauceLabs, "hideScrollBars", unsupported("scrollbars are hidden by SmartUI")),
    opt(P::SauceLabs, "sessionId", Discard),
    opt(P::SauceLabs, "jobId", Discard),
    opt(P::SauceLabs, "buildId", Discard),
    opt(P::SauceLabs, "testName", Discard),
    opt(P::SauceLabs, "suiteName", Discard),
];

/// Looks up an option key for `platform`.
///
/// # Examples
///
/// ```
/// use sm_core::Platform;
/// use sm_core::mapping::options::{option_role, OptionRole};
///
/// assert_eq!(
///     option_role(Platform::Percy, "ignore_region_selectors"),
///     Some(OptionRole::IgnoreSelectors)
/// );
/// assert_eq!(option_role(Platform::Percy, "colour"), None);
/// ```
#[must_use]
pub fn option_role(platform: Platform, key: &str) -> Option<OptionRole> {
    OPTION_RULES
        .iter()
        .find(|r| r.platform == platform && same_name(r.key, key))
        .map(|r| r.role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_platform_maps_ignore_and_name_or_full_page() {
        for platform in Platform::ALL {
            assert!(
                OPTION_RULES
                    .iter()
                    .any(|r| r.platform == platform && r.role == IgnoreSelectors),
                "{platform} has no ignore option"
            );
            assert!(
                OPTION_RULES
                    .iter()
                    .any(|r| r.platform == platform && r.role == FullPage),
                "{platform} has no full-page option"
            );
        }
    }

    #[test]
    fn test_unsupported_carries_reason() {
        let role = option_role(Platform::Percy, "widths");
        assert!(matches!(
            role,
            Some(OptionRole::Unsupported { reason }) if reason.contains(".smartui.json")
        ));
    }

    #[test]
    fn test_keys_are_unique_per_platform() {
        for (i, a) in OPTION_RULES.iter().enumerate() {
            for b in &OPTION_RULES[i + 1..] {
                assert!(
                    !(a.platform == b.platform && same_name(a.key, b.key)),
                    "duplicate key {} for {}",
                    a.key,
                    a.platform
                );
            }
        }
    }
}
