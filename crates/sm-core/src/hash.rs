//! Hashing helpers.
//!
//! Two unrelated kinds of hashing live here:
//!
//! - [`FxHashMap`] / [`FxHashSet`] aliases from `rustc-hash` for internal
//!   lookup tables (fast, not DoS-resistant).
//! - [`sha256_hex`], the content checksum stored in checkpoints and verified
//!   after rollback.
//!
//! # Examples
//!
//! ```
//! use sm_core::{FxHashMap, fx_hash_map, sha256_hex};
//!
//! let mut map: FxHashMap<&str, usize> = fx_hash_map();
//! map.insert("percySnapshot", 2);
//!
//! assert_eq!(sha256_hex(b"").len(), 64);
//! ```

use sha2::{Digest, Sha256};

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// Creates a new empty [`FxHashMap`].
#[inline]
#[must_use]
pub fn fx_hash_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::default()
}

/// Creates a new empty [`FxHashSet`].
#[inline]
#[must_use]
pub fn fx_hash_set<V>() -> FxHashSet<V> {
    FxHashSet::default()
}

/// Lowercase hex SHA-256 of `bytes`.
///
/// # Examples
///
/// ```
/// use sm_core::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b"abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
