//! Chain: the element sequence behind one bucket.

use crate::key_ops::KeyOps;
use crate::slab::Region;

/// A stored key/value pair with the key's hash captured at insertion.
///
/// The hash is never recomputed; lookups compare it before calling the
/// equality function.
#[derive(Clone, Debug)]
pub struct Element<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
}

impl<K, V> Element<K, V> {
    #[inline]
    pub(crate) fn new(key: K, value: V, hash: u64) -> Self {
        Self { key, value, hash }
    }

    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// The hash computed for `key` when this element was inserted.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }

    /// Cached-hash pre-filter, then the caller's equality.
    #[inline]
    pub(crate) fn matches<O>(&self, hash: u64, key: &K, ops: &O) -> bool
    where
        O: KeyOps<K>,
    {
        self.hash == hash && ops.equals(&self.key, key)
    }
}

/// Backing storage of a non-empty bucket (or an emptied buffer parked on the
/// allocator's free list).
///
/// Short chains live in slab regions; a chain that outgrows its region moves
/// to its own vector and grows by amortized doubling from then on.
#[derive(Debug)]
pub(crate) enum Chain<K, V> {
    Slab { region: Region, len: usize },
    Heap(Vec<Element<K, V>>),
}

impl<K, V> Chain<K, V> {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        match self {
            Chain::Slab { len, .. } => *len,
            Chain::Heap(vec) => vec.len(),
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        match self {
            Chain::Slab { region, .. } => region.capacity(),
            Chain::Heap(vec) => vec.capacity(),
        }
    }

    /// Whether the next push needs a bigger buffer first.
    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len() + 1 > self.capacity()
    }
}
