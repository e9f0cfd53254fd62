//! Cursor: restartable traversal of a `SlabHashMap` that can remove the
//! element it stands on.
//!
//! State is `(bucket, slot, ready)`. `ready` means `(bucket, slot)` names a
//! live element. Removing compacts the chain, shifting the following element
//! into `slot`, and clears `ready` so the next `move_next` re-examines the
//! same slot instead of stepping past it. Every element is therefore visited
//! exactly once no matter how many removals happen along the way.

use crate::chain::Element;
use crate::slab_hash_map::SlabHashMap;

/// A cursor over a [`SlabHashMap`], obtained from [`SlabHashMap::cursor`].
///
/// ```
/// use slab_hashmap::SlabHashMap;
///
/// let mut m: SlabHashMap<u32, u32> = SlabHashMap::default();
/// m.extend((0..10).map(|k| (k, k)));
///
/// let mut cursor = m.cursor();
/// while cursor.move_next() {
///     if cursor.current().key() % 2 == 1 {
///         cursor.remove_current();
///     }
/// }
/// assert_eq!(m.len(), 5);
/// ```
pub struct Cursor<'a, K, V, O> {
    map: &'a mut SlabHashMap<K, V, O>,
    bucket: usize,
    slot: usize,
    ready: bool,
}

impl<'a, K, V, O> Cursor<'a, K, V, O> {
    pub(crate) fn new(map: &'a mut SlabHashMap<K, V, O>) -> Self {
        Self {
            map,
            bucket: 0,
            slot: 0,
            ready: false,
        }
    }

    /// Advances to the next element. Returns `false` once every element has
    /// been visited.
    pub fn move_next(&mut self) -> bool {
        if self.ready {
            self.slot += 1;
        }
        let bucket_count = self.map.bucket_count();
        while self.bucket < bucket_count {
            if self.slot < self.map.chain_len(self.bucket) {
                self.ready = true;
                return true;
            }
            self.bucket += 1;
            self.slot = 0;
        }
        self.ready = false;
        false
    }

    /// Whether the cursor currently stands on an element.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// # Panics
    ///
    /// Panics unless the last call to `move_next` returned `true` and no
    /// removal happened since.
    pub fn current(&self) -> &Element<K, V> {
        assert!(self.ready, "cursor position not set");
        match self.map.element_at(self.bucket, self.slot) {
            Some(element) => element,
            None => panic!("cursor position out of bounds"),
        }
    }

    /// # Panics
    ///
    /// Same conditions as [`Cursor::current`].
    pub fn current_mut(&mut self) -> &mut Element<K, V> {
        assert!(self.ready, "cursor position not set");
        match self.map.element_at_mut(self.bucket, self.slot) {
            Some(element) => element,
            None => panic!("cursor position out of bounds"),
        }
    }

    /// Removes the current element and returns it. Call `move_next` before
    /// touching the cursor again.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is not standing on an element.
    pub fn remove_current(&mut self) -> (K, V) {
        assert!(self.ready, "cursor position not set");
        self.ready = false;
        match self.map.remove_at(self.bucket, self.slot) {
            Some(element) => element.into_parts(),
            None => panic!("cursor position out of bounds"),
        }
    }

    /// Rewinds to before the first element.
    pub fn reset(&mut self) {
        self.bucket = 0;
        self.slot = 0;
        self.ready = false;
    }
}
