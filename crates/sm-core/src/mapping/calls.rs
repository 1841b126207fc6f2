//! Call shapes that identify vendor API constructs, and what to do with them.
//!
//! Rules are tried in table order and the first match wins, so exact receiver
//! patterns are listed before broader ones.

use crate::types::Platform;

use super::same_name;

/// How a call receiver is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverPattern {
    /// The receiver text equals one of these (`cy`, `this.percy`).
    Exact(&'static [&'static str]),
    /// The last receiver segment ends with this, ignoring case
    /// (`eyes`, `this.eyes`, `visualEyes`).
    EndsWith(&'static str),
}

impl ReceiverPattern {
    /// Tests a receiver's source text.
    ///
    /// # Examples
    ///
    /// ```
    /// use sm_core::mapping::calls::ReceiverPattern;
    ///
    /// assert!(ReceiverPattern::EndsWith("eyes").matches("this.eyes"));
    /// assert!(ReceiverPattern::EndsWith("eyes").matches("mainEyes"));
    /// assert!(!ReceiverPattern::EndsWith("eyes").matches("eyes.config"));
    /// assert!(ReceiverPattern::Exact(&["cy"]).matches("cy"));
    /// ```
    #[must_use]
    pub fn matches(self, receiver: &str) -> bool {
        match self {
            Self::Exact(options) => options.contains(&receiver),
            Self::EndsWith(suffix) => {
                let last = receiver.rsplit('.').next().unwrap_or(receiver);
                last.len() >= suffix.len()
                    && last
                        .get(last.len() - suffix.len()..)
                        .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
            }
        }
    }
}

/// The structural shape of a vendor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    /// A bare function call: `percySnapshot(page, 'Home')`.
    Function {
        /// Function name.
        name: &'static str,
    },
    /// A method call: `cy.percySnapshot('Home')`.
    Method {
        /// Receiver pattern.
        receiver: ReceiverPattern,
        /// Method name.
        name: &'static str,
    },
    /// Object construction: `new Eyes()` or Python `Eyes()`. Compared exactly.
    Constructor {
        /// Class name.
        class: &'static str,
        /// Receiver the method rules expect for an instance of the class.
        /// A name bound to a construction is matched as if it were this.
        instance: Option<&'static str>,
    },
}

/// Where a snapshot call's driver comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverArg {
    /// The first positional argument, unless it is a string literal.
    Leading,
    /// Not passed; taken from the receiver if it is the framework driver,
    /// otherwise the framework's conventional identifier is assumed.
    Implicit,
}

/// The rewrite applied to a matched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Rename or rebuild as a SmartUI snapshot.
    Snapshot {
        /// Driver location.
        driver: DriverArg,
        /// Positional arguments after the driver dropped without comment.
        skip: u8,
    },
    /// Applitools `eyes.check(name?, Target...)` chains.
    FluentCheck,
    /// Session lifecycle; the owning statement is deleted.
    Remove,
}

impl Strategy {
    /// Returns `true` if a successful rewrite counts as a migrated snapshot.
    #[must_use]
    pub const fn counts_as_snapshot(self) -> bool {
        !matches!(self, Self::Remove)
    }
}

/// One call rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRule {
    /// Platform the call belongs to.
    pub platform: Platform,
    /// Shape to match.
    pub shape: CallShape,
    /// Rewrite to apply.
    pub strategy: Strategy,
}

impl CallRule {
    /// The receiver an instance built by this rule stands for.
    #[must_use]
    pub const fn instance(&self) -> Option<&'static str> {
        match self.shape {
            CallShape::Constructor { instance, .. } => instance,
            _ => None,
        }
    }

    /// Returns `true` for a bare-function snapshot rule.
    #[must_use]
    pub const fn is_snapshot_function(&self) -> bool {
        matches!(self.shape, CallShape::Function { .. })
            && matches!(self.strategy, Strategy::Snapshot { .. })
    }

    /// Tests a call against this rule's shape.
    ///
    /// `receiver` is the receiver's source text, `None` for bare calls.
    #[must_use]
    pub fn matches(&self, receiver: Option<&str>, name: &str, is_constructor: bool) -> bool {
        match (self.shape, receiver) {
            (CallShape::Function { name: expected }, None) => {
                !is_constructor && same_name(expected, name)
            }
            (CallShape::Method { receiver: pattern, name: expected }, Some(recv)) => {
                !is_constructor && pattern.matches(recv) && same_name(expected, name)
            }
            (CallShape::Constructor { class, .. }, None) => class == name,
            (CallShape::Constructor { class, .. }, Some(_)) => is_constructor && class == name,
            _ => false,
        }
    }
}

use DriverArg::{Implicit, Leading};
use Platform as P;

const fn func(platform: Platform, name: &'static str, strategy: Strategy) -> CallRule {
    CallRule {
        platform,
        shape: CallShape::Function { name },
        strategy,
    }
}

const fn method(
    platform: Platform,
    receiver: ReceiverPattern,
    name: &'static str,
    strategy: Strategy,
) -> CallRule {
    CallRule {
        platform,
        shape: CallShape::Method { receiver, name },
        strategy,
    }
}

const fn ctor(platform: Platform, class: &'static str, instance: Option<&'static str>) -> CallRule {
    CallRule {
        platform,
        shape: CallShape::Constructor { class, instance },
        strategy: Strategy::Remove,
    }
}

const fn snap(driver: DriverArg, skip: u8) -> Strategy {
    Strategy::Snapshot { driver, skip }
}

const CY: ReceiverPattern = ReceiverPattern::Exact(&["cy"]);
const PERCY: ReceiverPattern = ReceiverPattern::Exact(&["percy", "this.percy", "self.percy"]);
const EYES: ReceiverPattern = ReceiverPattern::EndsWith("eyes");
const RUNNER: ReceiverPattern = ReceiverPattern::EndsWith("runner");
const BROWSER: ReceiverPattern = ReceiverPattern::Exact(&["browser"]);
const VISUAL: ReceiverPattern = ReceiverPattern::EndsWith("visual");
const CLIENT: ReceiverPattern = ReceiverPattern::EndsWith("client");
const REMOVE: Strategy = Strategy::Remove;

/// Every call rule, in match priority order.
pub static CALL_RULES: &[CallRule] = &[
    // Percy
    func(P::Percy, "percySnapshot", snap(Leading, 0)),
    func(P::Percy, "percyScreenshot", snap(Leading, 0)),
    method(P::Percy, CY, "percySnapshot", snap(Implicit, 0)),
    method(P::Percy, PERCY, "snapshot", snap(Implicit, 0)),
    method(P::Percy, PERCY, "screenshot", snap(Implicit, 0)),
    ctor(P::Percy, "Percy", Some("percy")),
    ctor(P::Percy, "AppPercy", Some("percy")),
    // Applitools
    method(P::Applitools, CY, "eyesCheckWindow", snap(Implicit, 0)),
    method(P::Applitools, CY, "eyesOpen", REMOVE),
    method(P::Applitools, CY, "eyesClose", REMOVE),
    method(P::Applitools, CY, "eyesGetAllTestResults", REMOVE),
    method(P::Applitools, EYES, "check", Strategy::FluentCheck),
    method(P::Applitools, EYES, "checkWindow", snap(Implicit, 0)),
    method(P::Applitools, EYES, "open", REMOVE),
    method(P::Applitools, EYES, "close", REMOVE),
    method(P::Applitools, EYES, "closeAsync", REMOVE),
    method(P::Applitools, EYES, "abort", REMOVE),
    method(P::Applitools, EYES, "abortAsync", REMOVE),
    method(P::Applitools, EYES, "abortIfNotClosed", REMOVE),
    method(P::Applitools, EYES, "setApiKey", REMOVE),
    method(P::Applitools, EYES, "setBatch", REMOVE),
    method(P::Applitools, EYES, "setConfiguration", REMOVE),
    method(P::Applitools, EYES, "setLogHandler", REMOVE),
    method(P::Applitools, RUNNER, "getAllTestResults", REMOVE),
    ctor(P::Applitools, "Eyes", Some("eyes")),
    ctor(P::Applitools, "ClassicRunner", Some("runner")),
    ctor(P::Applitools, "VisualGridRunner", Some("runner")),
    ctor(P::Applitools, "BatchInfo", None),
    // Sauce Labs Visual
    method(P::SauceLabs, CY, "sauceVisualCheck", snap(Implicit, 0)),
    method(P::SauceLabs, BROWSER, "sauceVisualCheck", snap(Implicit, 0)),
    method(P::SauceLabs, VISUAL, "sauceVisualCheck", snap(Implicit, 0)),
    func(P::SauceLabs, "sauceVisualCheck", snap(Leading, 1)),
    method(P::SauceLabs, CLIENT, "createSnapshotFromWebdriver", snap(Implicit, 0)),
    method(P::SauceLabs, CLIENT, "createBuild", REMOVE),
    method(P::SauceLabs, CLIENT, "finishBuild", REMOVE),
    ctor(P::SauceLabs, "SauceLabsVisual", Some("client")),
];

/// Finds the first rule for `platform` matching a call.
///
/// # Examples
///
/// ```
/// use sm_core::Platform;
/// use sm_core::mapping::calls::{match_call, Strategy};
///
/// let rule = match_call(Platform::Applitools, Some("this.eyes"), "close_async", false);
/// assert_eq!(rule.map(|r| r.strategy), Some(Strategy::Remove));
/// assert!(match_call(Platform::Percy, None, "smartuiSnapshot", false).is_none());
/// ```
#[must_use]
pub fn match_call(
    platform: Platform,
    receiver: Option<&str>,
    name: &str,
    is_constructor: bool,
) -> Option<&'static CallRule> {
    CALL_RULES
        .iter()
        .filter(|r| r.platform == platform)
        .find(|r| r.matches(receiver, name, is_constructor))
}

/// The snapshot function a module's default export is, for platforms whose
/// SDKs export one (`import percySnapshot from '@percy/playwright'`).
///
/// # Examples
///
/// ```
/// use sm_core::Platform;
/// use sm_core::mapping::calls::default_snapshot_function;
///
/// assert_eq!(default_snapshot_function(Platform::Percy), Some("percySnapshot"));
/// assert_eq!(default_snapshot_function(Platform::Applitools), None);
/// ```
#[must_use]
pub fn default_snapshot_function(platform: Platform) -> Option<&'static str> {
    CALL_RULES
        .iter()
        .filter(|r| r.platform == platform && r.is_snapshot_function())
        .find_map(|r| match r.shape {
            CallShape::Function { name } => Some(name),
            _ => None,
        })
}

/// The canonical snapshot function `name` refers to, if it is one.
#[must_use]
pub fn snapshot_function(platform: Platform, name: &str) -> Option<&'static str> {
    CALL_RULES
        .iter()
        .filter(|r| r.platform == platform && r.is_snapshot_function())
        .find_map(|r| match r.shape {
            CallShape::Function { name: expected } if same_name(expected, name) => Some(expected),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_vs_method() {
        assert!(match_call(Platform::Percy, None, "percySnapshot", false).is_some());
        assert!(match_call(Platform::Percy, None, "percy_snapshot", false).is_some());
        assert!(match_call(Platform::Percy, Some("cy"), "percySnapshot", false).is_some());
        assert!(match_call(Platform::Percy, Some("helpers"), "percySnapshot", false).is_none());
    }

    #[test]
    fn test_constructor_requires_exact_class() {
        assert!(match_call(Platform::Applitools, None, "Eyes", true).is_some());
        assert!(match_call(Platform::Applitools, None, "Eyes", false).is_some());
        assert!(match_call(Platform::Applitools, None, "eyes", false).is_none());
        assert!(match_call(Platform::Applitools, Some("applitools"), "Eyes", false).is_none());
    }

    #[test]
    fn test_receiver_suffix_is_last_segment() {
        assert!(match_call(Platform::Applitools, Some("this.eyes"), "check", false).is_some());
        assert!(match_call(Platform::Applitools, Some("self.eyes"), "check_window", false).is_some());
        assert!(match_call(Platform::Applitools, Some("eyes.runner"), "check", false).is_none());
    }

    #[test]
    fn test_no_target_names_match() {
        for platform in Platform::ALL {
            for receiver in [None, Some("cy"), Some("SmartUISnapshot")] {
                assert!(match_call(platform, receiver, "smartuiSnapshot", false).is_none());
                assert!(match_call(platform, receiver, "smartui_snapshot", false).is_none());
            }
        }
    }

    #[test]
    fn test_constructed_instance_receivers() {
        let eyes = match_call(Platform::Applitools, None, "Eyes", true).expect("rule");
        assert_eq!(eyes.instance(), Some("eyes"));
        let sauce = match_call(Platform::SauceLabs, None, "SauceLabsVisual", false).expect("rule");
        assert_eq!(sauce.instance(), Some("client"));
        let instance = sauce.instance().expect("instance");
        assert!(match_call(Platform::SauceLabs, Some(instance), "create_build", false).is_some());
        let batch = match_call(Platform::Applitools, None, "BatchInfo", true).expect("rule");
        assert_eq!(batch.instance(), None);
    }

    #[test]
    fn test_snapshot_functions() {
        assert_eq!(snapshot_function(Platform::Percy, "percy_snapshot"), Some("percySnapshot"));
        assert_eq!(snapshot_function(Platform::SauceLabs, "sauceVisualCheck"), Some("sauceVisualCheck"));
        assert_eq!(snapshot_function(Platform::Applitools, "Eyes"), None);
        assert_eq!(default_snapshot_function(Platform::SauceLabs), Some("sauceVisualCheck"));
    }

    #[test]
    fn test_removal_does_not_count() {
        assert!(!Strategy::Remove.counts_as_snapshot());
        assert!(Strategy::FluentCheck.counts_as_snapshot());
    }
}
