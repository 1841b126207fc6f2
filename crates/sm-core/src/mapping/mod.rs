//! Static mapping tables from source platforms to SmartUI.
//!
//! Everything in this module is plain data plus lookup functions; nothing
//! here touches the filesystem or parses code.
//!
//! - [`dependencies`] - package names that evidence a platform or framework
//! - [`modules`] - module references and the target module they become
//! - [`calls`] - call shapes and the rewrite strategy for each
//! - [`options`] - option keys and the role each plays in a snapshot call
//! - [`files`] - configuration, CI and framework marker files
//! - [`target`] - SmartUI names, generated artifacts and CI substitutions
//!
//! Call and option names are stored in camelCase and compared through
//! [`canonical`], so one table serves JavaScript, Python and Java:
//!
//! ```
//! use sm_core::mapping::canonical;
//!
//! assert_eq!(canonical("percy_snapshot"), canonical("percySnapshot"));
//! assert_eq!(canonical("check_window"), "checkwindow");
//! ```

pub mod calls;
pub mod dependencies;
pub mod files;
pub mod modules;
pub mod options;
pub mod target;

/// Version of the mapping tables, recorded in checkpoint metadata.
pub const MAPPING_TABLE_VERSION: &str = "2024.11";

/// Folds an identifier for table lookup: lowercase, underscores removed.
#[must_use]
pub fn canonical(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compares two identifiers after [`canonical`] folding.
#[must_use]
pub fn same_name(a: &str, b: &str) -> bool {
    let mut left = a.chars().filter(|c| *c != '_').flat_map(char::to_lowercase);
    let mut right = b.chars().filter(|c| *c != '_').flat_map(char::to_lowercase);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => {}
            _ => return false,
        }
    }
}

/// Converts a camelCase identifier to snake_case.
///
/// # Examples
///
/// ```
/// use sm_core::mapping::to_snake_case;
///
/// assert_eq!(to_snake_case("smartuiSnapshot"), "smartui_snapshot");
/// assert_eq!(to_snake_case("ignoreDOM"), "ignore_dom");
/// ```
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}
