//! Hash mixing helpers for building `K -> u64` functions out of field hashes.
//!
//! Keys with non-primitive members (sequences, nested structs) are hashed by
//! hashing each member separately and folding the results with
//! [`combine_hash`], starting from [`HASH_SEED`].

use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Initial seed for [`combine_hashes`] (FNV-1a 64-bit offset basis).
pub const HASH_SEED: u64 = 14695981039346656037;

/// Mixing prime used by [`combine_hash`] (FNV-1a 64-bit prime).
pub const MIX_PRIME: u64 = 1099511628211;

/// Combine a running `seed` with one more `hash`.
///
/// `seed ^ (hash + MIX_PRIME + (seed << 6) + (seed >> 2))`, with wrapping
/// arithmetic.
#[inline]
pub const fn combine_hash(seed: u64, hash: u64) -> u64 {
    seed ^ hash
        .wrapping_add(MIX_PRIME)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

/// Fold a sequence of hashes into one, starting from [`HASH_SEED`].
///
/// ```
/// use slab_hashmap::hashing::{combine_hash, combine_hashes, HASH_SEED};
///
/// let h = combine_hashes([1, 2]);
/// assert_eq!(h, combine_hash(combine_hash(HASH_SEED, 1), 2));
/// assert_eq!(combine_hashes(std::iter::empty::<u64>()), HASH_SEED);
/// ```
#[inline]
pub fn combine_hashes<I>(hashes: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    hashes.into_iter().fold(HASH_SEED, combine_hash)
}

/// Returns a seeded hash function for any `T: Hash`.
///
/// Every call draws fresh SipHash keys from [`RandomState`], so two hashers
/// disagree with each other; a single hasher is deterministic for its whole
/// lifetime and must be the one handed to a map.
pub fn new_hasher<T>() -> impl Fn(&T) -> u64 + Clone
where
    T: ?Sized + Hash,
{
    let state = RandomState::new();
    move |value: &T| state.hash_one(value)
}

/// Equality function for any `T: PartialEq`, usable wherever a map wants an
/// `Fn(&K, &K) -> bool`.
#[inline]
pub fn equal<T>(a: &T, b: &T) -> bool
where
    T: ?Sized + PartialEq,
{
    a == b
}
