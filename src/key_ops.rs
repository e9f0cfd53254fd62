//! KeyOps: the hash/equality capability a map is parameterised over.

use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Hash and equality for keys of type `K`.
///
/// The two functions must agree: `equals(a, b)` implies `hash(a) == hash(b)`,
/// and both must be deterministic for the lifetime of the map holding them.
pub trait KeyOps<K> {
    fn hash(&self, key: &K) -> u64;
    fn equals(&self, a: &K, b: &K) -> bool;
}

/// `KeyOps` built from a pair of closures.
#[derive(Clone)]
pub struct FnOps<E, H> {
    equal: E,
    hash: H,
}

impl<E, H> FnOps<E, H> {
    pub fn new(equal: E, hash: H) -> Self {
        Self { equal, hash }
    }
}

impl<K, E, H> KeyOps<K> for FnOps<E, H>
where
    E: Fn(&K, &K) -> bool,
    H: Fn(&K) -> u64,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        (self.equal)(a, b)
    }
}

/// `KeyOps` for keys that already implement `Hash + Eq`, hashed through a
/// `BuildHasher` (randomly seeded `RandomState` by default).
#[derive(Clone, Default)]
pub struct StdOps<S = RandomState> {
    hash_builder: S,
}

impl StdOps {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> StdOps<S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        Self { hash_builder }
    }
}

impl<K, S> KeyOps<K> for StdOps<S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.hash_builder.hash_one(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
}
