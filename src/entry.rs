//! Entry API: a borrow-checked handle onto one slot of a `SlabHashMap`.
//!
//! `Occupied` points at an existing element by `(bucket, position)`;
//! `Vacant` carries the key and its hash until `insert` commits it.

use crate::chain::Element;
use crate::slab_hash_map::SlabHashMap;

/// A view into a single slot of the map, either occupied or vacant.
///
/// Constructed by [`SlabHashMap::entry`].
pub enum Entry<'a, K, V, O> {
    Occupied(OccupiedEntry<'a, K, V, O>),
    Vacant(VacantEntry<'a, K, V, O>),
}

impl<'a, K, V, O> Entry<'a, K, V, O> {
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Like `or_insert_with`, but the closure sees the key being inserted.
    pub fn or_insert_with_key<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = default(&entry.key);
                entry.insert(value)
            }
        }
    }

    /// Runs `f` on the value if the entry is occupied.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V, O> Entry<'a, K, V, O>
where
    V: Default,
{
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a present element.
pub struct OccupiedEntry<'a, K, V, O> {
    map: &'a mut SlabHashMap<K, V, O>,
    bucket: usize,
    pos: usize,
}

impl<'a, K, V, O> OccupiedEntry<'a, K, V, O> {
    pub(crate) fn new(map: &'a mut SlabHashMap<K, V, O>, bucket: usize, pos: usize) -> Self {
        Self { map, bucket, pos }
    }

    fn element(&self) -> &Element<K, V> {
        self.map
            .element_at(self.bucket, self.pos)
            .expect("occupied entry must point at a live element")
    }

    fn element_mut(&mut self) -> &mut Element<K, V> {
        self.map
            .element_at_mut(self.bucket, self.pos)
            .expect("occupied entry must point at a live element")
    }

    pub(crate) fn into_element(self) -> &'a mut Element<K, V> {
        let map = self.map;
        map.element_at_mut(self.bucket, self.pos)
            .expect("occupied entry must point at a live element")
    }

    pub fn key(&self) -> &K {
        &self.element().key
    }

    pub fn get(&self) -> &V {
        &self.element().value
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.element_mut().value
    }

    pub fn into_mut(self) -> &'a mut V {
        &mut self.into_element().value
    }

    /// Replaces the value in place and returns the old one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    pub fn remove_entry(self) -> (K, V) {
        self.map
            .remove_at(self.bucket, self.pos)
            .map(Element::into_parts)
            .expect("occupied entry must point at a live element")
    }
}

/// A view into a missing key. Nothing is stored until [`VacantEntry::insert`].
pub struct VacantEntry<'a, K, V, O> {
    map: &'a mut SlabHashMap<K, V, O>,
    key: K,
    hash: u64,
    bucket: usize,
}

impl<'a, K, V, O> VacantEntry<'a, K, V, O> {
    pub(crate) fn new(map: &'a mut SlabHashMap<K, V, O>, key: K, hash: u64, bucket: usize) -> Self {
        Self {
            map,
            key,
            hash,
            bucket,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }

    /// Stores the key with `value` and returns the slot, which stays put for
    /// as long as the returned borrow lives.
    pub(crate) fn insert_element(self, value: V) -> &'a mut Element<K, V> {
        let element = Element::new(self.key, value, self.hash);
        let map = self.map;
        let pos = map.append(self.bucket, element);
        map.element_at_mut(self.bucket, pos)
            .expect("appended element must be addressable")
    }

    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.insert_element(value).value
    }
}

#[cfg(test)]
mod tests {
    use crate::hashing::equal;
    use crate::{Entry, SlabHashMap};

    fn same_bucket(_: &&'static str) -> u64 {
        7
    }

    /// Invariant: entries resolve colliding keys by equality, not hash.
    #[test]
    fn entry_on_collisions() {
        let mut m = SlabHashMap::with_bucket_count(equal::<&'static str>, same_bucket, 2);
        *m.entry("a").or_insert(0) += 1;
        *m.entry("b").or_insert(10) += 1;
        *m.entry("a").or_insert(0) += 1;
        assert_eq!(m.get(&"a"), Some(&2));
        assert_eq!(m.get(&"b"), Some(&11));
        assert_eq!(m.len(), 2);

        match m.entry("b") {
            Entry::Occupied(o) => assert_eq!(o.remove_entry(), ("b", 11)),
            Entry::Vacant(_) => panic!("b must be present"),
        }
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&"a"), Some(&2));
    }

    /// Invariant: a vacant entry stores nothing until insert commits it.
    #[test]
    fn vacant_entry_commits_on_insert() {
        let mut m = SlabHashMap::with_bucket_count(equal::<&'static str>, same_bucket, 2);
        match m.entry("k") {
            Entry::Vacant(v) => assert_eq!(v.into_key(), "k"),
            Entry::Occupied(_) => panic!("k must be absent"),
        }
        assert!(m.is_empty());

        let len = m.entry("k").or_insert_with_key(|k| k.len());
        assert_eq!(*len, 1);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn and_modify_only_touches_present_values() {
        let mut m: SlabHashMap<&'static str, u32, _> =
            SlabHashMap::with_bucket_count(equal::<&'static str>, same_bucket, 2);
        m.entry("x").and_modify(|v| *v += 100).or_default();
        m.entry("x").and_modify(|v| *v += 100).or_default();
        assert_eq!(m.get(&"x"), Some(&100u32));
        match m.entry("x") {
            Entry::Occupied(mut o) => {
                assert_eq!(o.key(), &"x");
                assert_eq!(o.insert(5), 100);
                assert_eq!(*o.get(), 5);
            }
            Entry::Vacant(_) => panic!("x must be present"),
        }
    }
}
