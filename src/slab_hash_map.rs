//! SlabHashMap: fixed bucket array of short chains, keyed through `KeyOps`.

use crate::chain::{Chain, Element};
use crate::config::{ConfigError, MapConfig};
use crate::cursor::Cursor;
use crate::entry::{Entry, OccupiedEntry, VacantEntry};
use crate::key_ops::{FnOps, KeyOps, StdOps};
use crate::slab::{Elements, SlabAllocator, SlabElementsMut};
use core::fmt;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::slice;
use tracing::debug;

/// Chains shorter than this grow into a dedicated slab region.
const SMALL_CHAIN_LIMIT: usize = 3;
/// Capacity of the region a small chain grows into.
const SMALL_CHAIN_CAPACITY: usize = 4;

/// A hash map over arbitrary keys with caller-supplied hash and equality.
///
/// The bucket count is fixed at construction and never changes, so it should
/// be sized close to the expected number of entries. Each bucket holds a
/// short chain scanned linearly; chains of up to four elements are carved
/// from shared slabs owned by the map.
///
/// ```
/// use slab_hashmap::hashing::{combine_hash, combine_hashes, equal, new_hasher, HASH_SEED};
/// use slab_hashmap::SlabHashMap;
///
/// #[derive(PartialEq)]
/// struct Key {
///     id: u32,
///     tags: Vec<String>,
/// }
///
/// let id_hash = new_hasher::<u32>();
/// let tag_hash = new_hasher::<str>();
/// let hash = move |k: &Key| {
///     let tags = k.tags.iter().fold(HASH_SEED, |h, t| combine_hash(h, tag_hash(t.as_str())));
///     combine_hashes([id_hash(&k.id), tags])
/// };
///
/// let mut m = SlabHashMap::with_bucket_count(equal::<Key>, hash, 1024);
/// m.insert(Key { id: 1, tags: vec!["a".into()] }, "one");
/// m.upsert(Key { id: 1, tags: vec!["a".into()] }, |e, exists| {
///     assert!(exists);
///     *e.value_mut() = "uno";
/// });
/// assert_eq!(m.get(&Key { id: 1, tags: vec!["a".into()] }), Some(&"uno"));
/// assert_eq!(m.len(), 1);
/// ```
pub struct SlabHashMap<K, V, O = StdOps> {
    ops: O,
    buckets: Box<[Option<Chain<K, V>>]>,
    len: usize,
    alloc: SlabAllocator<K, V>,
}

impl<K, V, E, H> SlabHashMap<K, V, FnOps<E, H>>
where
    E: Fn(&K, &K) -> bool,
    H: Fn(&K) -> u64,
{
    /// Creates a map with the default bucket count (64Ki).
    pub fn new(equal: E, hash: H) -> Self {
        Self::with_ops(FnOps::new(equal, hash), MapConfig::default())
    }

    /// Creates a map with `bucket_count` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_count` is zero.
    pub fn with_bucket_count(equal: E, hash: H, bucket_count: usize) -> Self {
        match MapConfig::with_bucket_count(bucket_count) {
            Ok(config) => Self::with_ops(FnOps::new(equal, hash), config),
            Err(e) => panic!("{e}"),
        }
    }

    /// Creates a map from an optional bucket-count override: an empty slice
    /// selects the default, a single value selects that count, and anything
    /// longer is rejected.
    pub fn try_with_overrides(equal: E, hash: H, overrides: &[usize]) -> Result<Self, ConfigError> {
        let config = MapConfig::from_overrides(overrides)?;
        Ok(Self::with_ops(FnOps::new(equal, hash), config))
    }
}

impl<K, V> SlabHashMap<K, V>
where
    K: Hash + Eq,
{
    /// Creates a map over `K: Hash + Eq` keys using a randomly seeded hasher.
    pub fn with_config(config: MapConfig) -> Self {
        Self::with_ops(StdOps::new(), config)
    }
}

impl<K, V> Default for SlabHashMap<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::with_config(MapConfig::default())
    }
}

impl<K, V, O> SlabHashMap<K, V, O>
where
    O: KeyOps<K>,
{
    pub fn with_ops(ops: O, config: MapConfig) -> Self {
        let bucket_count = config.bucket_count();
        debug!(bucket_count, "creating slab hash map");
        Self {
            ops,
            buckets: core::iter::repeat_with(|| None).take(bucket_count).collect(),
            len: 0,
            alloc: SlabAllocator::new(),
        }
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    #[inline]
    fn probe(&self, hash: u64, bucket: usize, key: &K) -> Option<usize> {
        let chain = self.buckets[bucket].as_ref()?;
        self.alloc.position(chain, hash, key, &self.ops)
    }

    /// Hash, bucket index and in-chain position (if present) of `key`.
    #[inline]
    fn locate(&self, key: &K) -> (u64, usize, Option<usize>) {
        let hash = self.ops.hash(key);
        let bucket = self.bucket_of(hash);
        (hash, bucket, self.probe(hash, bucket, key))
    }

    pub fn get_element(&self, key: &K) -> Option<&Element<K, V>> {
        let (_, bucket, pos) = self.locate(key);
        self.element_at(bucket, pos?)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_element(key).map(Element::value)
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.get_element(key).map(|e| (&e.key, &e.value))
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (_, bucket, pos) = self.locate(key);
        self.element_at_mut(bucket, pos?).map(Element::value_mut)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.locate(key).2.is_some()
    }

    /// Inserts or overwrites `key`. An existing entry keeps its slot and
    /// returns the previous value; `len` only changes for a new key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut o) => Some(o.insert(value)),
            Entry::Vacant(v) => {
                v.insert(value);
                None
            }
        }
    }

    /// Calls `update` exactly once with the element for `key`, creating it
    /// first with `V::default()` when missing. The flag tells whether the key
    /// already existed.
    pub fn upsert<F>(&mut self, key: K, update: F)
    where
        V: Default,
        F: FnOnce(&mut Element<K, V>, bool),
    {
        match self.entry(key) {
            Entry::Occupied(o) => update(o.into_element(), true),
            Entry::Vacant(v) => update(v.insert_element(V::default()), false),
        }
    }

    /// Gets the slot for `key` for in-place inspection or insertion.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, O> {
        let (hash, bucket, pos) = self.locate(&key);
        match pos {
            Some(pos) => Entry::Occupied(OccupiedEntry::new(self, bucket, pos)),
            None => Entry::Vacant(VacantEntry::new(self, key, hash, bucket)),
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        self.remove_entry(key).map(Element::into_parts)
    }

    pub fn remove_entry(&mut self, key: &K) -> Option<Element<K, V>> {
        let (_, bucket, pos) = self.locate(key);
        self.remove_at(bucket, pos?)
    }
}

impl<K, V, O> SlabHashMap<K, V, O> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Removes every entry. Chains are dropped rather than recycled, so later
    /// inserts carve fresh slab space instead of drawing on the free list.
    pub fn clear(&mut self) {
        for slot in self.buckets.iter_mut() {
            if let Some(chain) = slot.take() {
                self.alloc.discard(chain);
            }
        }
        self.len = 0;
        debug!(bucket_count = self.buckets.len(), "cleared slab hash map");
    }

    /// A cursor over all entries that can remove the current one without
    /// skipping or repeating any other.
    pub fn cursor(&mut self) -> Cursor<'_, K, V, O> {
        Cursor::new(self)
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cursor = self.cursor();
        while cursor.move_next() {
            let element = cursor.current_mut();
            if !keep(&element.key, &mut element.value) {
                cursor.remove_current();
            }
        }
    }

    /// Iterates entries in bucket order, then chain order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            alloc: &self.alloc,
            chain: None,
            remaining: self.len,
        }
    }

    /// Iterates entries mutably, in no particular order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            slab: self.alloc.slab_elements_mut(),
            buckets: self.buckets.iter_mut(),
            heap: Default::default(),
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    #[cfg(any(test, feature = "stats"))]
    pub fn allocator_stats(&self) -> AllocatorStats {
        AllocatorStats {
            slabs: self.alloc.slab_count(),
            free_buffers: self.alloc.free_buffers(),
            bucket_count: self.buckets.len(),
            occupied_buckets: self.buckets.iter().filter(|b| b.is_some()).count(),
        }
    }

    pub(crate) fn chain_len(&self, bucket: usize) -> usize {
        self.buckets
            .get(bucket)
            .and_then(Option::as_ref)
            .map_or(0, Chain::len)
    }

    pub(crate) fn element_at(&self, bucket: usize, pos: usize) -> Option<&Element<K, V>> {
        let chain = self.buckets.get(bucket)?.as_ref()?;
        self.alloc.get(chain, pos)
    }

    pub(crate) fn element_at_mut(&mut self, bucket: usize, pos: usize) -> Option<&mut Element<K, V>> {
        let chain = self.buckets.get_mut(bucket)?.as_mut()?;
        self.alloc.get_mut(chain, pos)
    }

    /// Appends a new element to `bucket`, growing the chain as needed, and
    /// returns its position. The element does not move again until the next
    /// mutation of this bucket.
    pub(crate) fn append(&mut self, bucket: usize, element: Element<K, V>) -> usize {
        self.len += 1;
        let mut chain = match self.buckets[bucket].take() {
            Some(chain) => chain,
            None => self.alloc.new_chain_buffer(1),
        };
        if chain.is_full() {
            chain = if chain.len() < SMALL_CHAIN_LIMIT {
                let mut larger = self.alloc.new_chain_buffer(SMALL_CHAIN_CAPACITY);
                self.alloc.transfer(&mut chain, &mut larger);
                self.alloc.free_chain_buffer(chain);
                larger
            } else {
                self.alloc.spill(chain)
            };
        }
        self.alloc.push(&mut chain, element);
        let pos = chain.len() - 1;
        self.buckets[bucket] = Some(chain);
        pos
    }

    /// Removes the element at `(bucket, pos)`, compacting the chain. An
    /// emptied chain goes back to the allocator; a sparse heap chain is
    /// shrunk to half its capacity.
    pub(crate) fn remove_at(&mut self, bucket: usize, pos: usize) -> Option<Element<K, V>> {
        let chain = self.buckets.get_mut(bucket)?.as_mut()?;
        let element = self.alloc.take(chain, pos)?;
        self.len -= 1;
        if chain.is_empty() {
            if let Some(chain) = self.buckets[bucket].take() {
                self.alloc.free_chain_buffer(chain);
            }
        } else if chain.len() + 1 < chain.capacity() / 3 {
            self.alloc.shrink(chain);
        }
        Some(element)
    }
}

#[cfg(test)]
impl<K, V, O> SlabHashMap<K, V, O>
where
    O: KeyOps<K>,
{
    /// Panics unless `len` matches the chains, every element sits in the
    /// bucket its cached hash selects, and slab slots hold exactly the
    /// slab-resident elements.
    pub(crate) fn assert_invariants(&mut self) {
        let mut total = 0;
        let mut in_slabs = 0;
        for (b, slot) in self.buckets.iter().enumerate() {
            let Some(chain) = slot else { continue };
            assert!(!chain.is_empty(), "empty chains must be unallocated");
            assert!(chain.capacity() >= chain.len());
            if let Chain::Slab { len, .. } = chain {
                in_slabs += len;
            }
            for e in self.alloc.elements(chain) {
                assert_eq!(self.ops.hash(&e.key), e.hash);
                assert_eq!(self.bucket_of(e.hash), b);
                total += 1;
            }
            assert_eq!(self.alloc.elements(chain).count(), chain.len());
        }
        assert_eq!(total, self.len);
        assert_eq!(self.alloc.slab_elements_mut().count(), in_slabs);
        assert!(self.alloc.free_buffers() <= crate::slab::MAX_FREE_BUFFERS);
    }
}

impl<K, V, O> Extend<(K, V)> for SlabHashMap<K, V, O>
where
    O: KeyOps<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, O> fmt::Debug for SlabHashMap<K, V, O>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, O> IntoIterator for &'a SlabHashMap<K, V, O> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, O> IntoIterator for &'a mut SlabHashMap<K, V, O> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Slab and bucket occupancy of one map.
#[cfg(any(test, feature = "stats"))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AllocatorStats {
    pub slabs: usize,
    pub free_buffers: usize,
    pub bucket_count: usize,
    pub occupied_buckets: usize,
}

/// Iterator over `(&K, &V)` in bucket order.
pub struct Iter<'a, K, V> {
    buckets: slice::Iter<'a, Option<Chain<K, V>>>,
    alloc: &'a SlabAllocator<K, V>,
    chain: Option<Elements<'a, K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.chain.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
            let alloc = self.alloc;
            self.chain = self.buckets.next()?.as_ref().map(|c| alloc.elements(c));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)`: slab-resident elements first, then heap
/// chains in bucket order.
pub struct IterMut<'a, K, V> {
    slab: SlabElementsMut<'a, K, V>,
    buckets: slice::IterMut<'a, Option<Chain<K, V>>>,
    heap: slice::IterMut<'a, Element<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let e = match self.slab.next() {
            Some(e) => e,
            None => loop {
                if let Some(e) = self.heap.next() {
                    break e;
                }
                if let Some(Chain::Heap(vec)) = self.buckets.next()? {
                    self.heap = vec.iter_mut();
                }
            },
        };
        self.remaining -= 1;
        Some((&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
