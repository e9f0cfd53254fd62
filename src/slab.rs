//! SlabAllocator: bump-allocates short chains out of shared slabs and recycles
//! freed chain buffers through a bounded free list.
//!
//! Slabs are fixed arrays of `Option<Element>` slots kept in a generational
//! `SlotMap`. Regions are carved from the tail of the current slab. Each slab
//! counts the regions carved from it that are still outstanding (owned by a
//! bucket or parked on the free list); a slab that is no longer current and
//! has no outstanding regions is released.
//!
//! Slot invariant: a slot is `Some` iff it holds a live element of the map.
//! Vacated, freed and never-carved slots are `None`.

use crate::chain::{Chain, Element};
use crate::key_ops::KeyOps;
use core::iter::Flatten;
use core::slice;
use slotmap::{new_key_type, SlotMap};
use tracing::trace;

/// Slots per slab.
pub(crate) const SLAB_SLOTS: usize = 1024;
/// Upper bound on recycled buffers kept for reuse.
pub(crate) const MAX_FREE_BUFFERS: usize = 128;

new_key_type! {
    pub(crate) struct SlabKey;
}

/// A contiguous run of slots inside one slab.
#[derive(Debug)]
pub(crate) struct Region {
    slab: SlabKey,
    start: usize,
    cap: usize,
}

impl Region {
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }
}

struct Slab<K, V> {
    slots: Box<[Option<Element<K, V>>]>,
    // Slots [0, uncarved) are still available; regions come off the top.
    uncarved: usize,
    regions: usize,
}

impl<K, V> Slab<K, V> {
    fn new() -> Self {
        Self {
            slots: core::iter::repeat_with(|| None).take(SLAB_SLOTS).collect(),
            uncarved: SLAB_SLOTS,
            regions: 0,
        }
    }
}

pub(crate) struct SlabAllocator<K, V> {
    slabs: SlotMap<SlabKey, Slab<K, V>>,
    current: Option<SlabKey>,
    free: Vec<Chain<K, V>>,
}

impl<K, V> SlabAllocator<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slabs: SlotMap::with_key(),
            current: None,
            free: Vec::new(),
        }
    }

    /// Returns an empty chain buffer with room for at least `capacity` elements.
    ///
    /// The most recently freed buffer is reused when it is large enough;
    /// otherwise `capacity` slots are carved from the current slab, bumping a
    /// fresh slab when the current one cannot fit them.
    pub(crate) fn new_chain_buffer(&mut self, capacity: usize) -> Chain<K, V> {
        debug_assert!(capacity > 0 && capacity <= SLAB_SLOTS);
        if self.free.last().is_some_and(|c| c.capacity() >= capacity) {
            if let Some(chain) = self.free.pop() {
                return chain;
            }
        }

        let key = match self.current {
            Some(key) if self.slabs.get(key).is_some_and(|s| s.uncarved >= capacity) => key,
            _ => self.bump_slab(),
        };
        let slab = &mut self.slabs[key];
        slab.uncarved -= capacity;
        slab.regions += 1;
        Chain::Slab {
            region: Region {
                slab: key,
                start: slab.uncarved,
                cap: capacity,
            },
            len: 0,
        }
    }

    /// Empties `chain` and parks it on the free list, or discards it when the
    /// free list is full.
    pub(crate) fn free_chain_buffer(&mut self, mut chain: Chain<K, V>) {
        self.truncate(&mut chain);
        if self.free.len() < MAX_FREE_BUFFERS {
            self.free.push(chain);
        } else {
            trace!(capacity = chain.capacity(), "free list full, discarding chain buffer");
            self.discard(chain);
        }
    }

    /// Drops `chain` and its elements without recycling the buffer.
    pub(crate) fn discard(&mut self, mut chain: Chain<K, V>) {
        self.truncate(&mut chain);
        if let Chain::Slab { region, .. } = chain {
            if let Some(slab) = self.slabs.get_mut(region.slab) {
                slab.regions = slab.regions.saturating_sub(1);
            }
            self.release_if_idle(region.slab);
        }
    }

    fn bump_slab(&mut self) -> SlabKey {
        if let Some(old) = self.current.take() {
            self.release_if_idle(old);
        }
        let key = self.slabs.insert(Slab::new());
        self.current = Some(key);
        trace!(slabs = self.slabs.len(), "bumped fresh slab");
        key
    }

    fn release_if_idle(&mut self, key: SlabKey) {
        if self.current == Some(key) {
            return;
        }
        if self.slabs.get(key).is_some_and(|s| s.regions == 0) {
            self.slabs.remove(key);
            trace!(slabs = self.slabs.len(), "released idle slab");
        }
    }

    fn truncate(&mut self, chain: &mut Chain<K, V>) {
        match chain {
            Chain::Slab { region, len } => {
                if let Some(slab) = self.slabs.get_mut(region.slab) {
                    slab.slots[region.start..region.start + *len].fill_with(|| None);
                }
                *len = 0;
            }
            Chain::Heap(vec) => vec.clear(),
        }
    }

    pub(crate) fn elements<'a>(&'a self, chain: &'a Chain<K, V>) -> Elements<'a, K, V> {
        match chain {
            Chain::Slab { region, len } => {
                let live: &'a [Option<Element<K, V>>] = match self.slabs.get(region.slab) {
                    Some(slab) => &slab.slots[region.start..region.start + *len],
                    None => &[],
                };
                Elements::Slab(live.iter().flatten())
            }
            Chain::Heap(vec) => Elements::Heap(vec.iter()),
        }
    }

    #[inline]
    pub(crate) fn get<'a>(&'a self, chain: &'a Chain<K, V>, pos: usize) -> Option<&'a Element<K, V>> {
        match chain {
            Chain::Slab { region, len } if pos < *len => {
                self.slabs.get(region.slab)?.slots[region.start + pos].as_ref()
            }
            Chain::Slab { .. } => None,
            Chain::Heap(vec) => vec.get(pos),
        }
    }

    #[inline]
    pub(crate) fn get_mut<'a>(
        &'a mut self,
        chain: &'a mut Chain<K, V>,
        pos: usize,
    ) -> Option<&'a mut Element<K, V>> {
        match chain {
            Chain::Slab { region, len } if pos < *len => {
                self.slabs.get_mut(region.slab)?.slots[region.start + pos].as_mut()
            }
            Chain::Slab { .. } => None,
            Chain::Heap(vec) => vec.get_mut(pos),
        }
    }

    /// Position of `key` in `chain`: slot 0 first, then the rest in order.
    #[inline]
    pub(crate) fn position<O>(&self, chain: &Chain<K, V>, hash: u64, key: &K, ops: &O) -> Option<usize>
    where
        O: KeyOps<K>,
    {
        let mut elements = self.elements(chain);
        if elements.next()?.matches(hash, key, ops) {
            return Some(0);
        }
        // slow path
        elements
            .position(|e| e.matches(hash, key, ops))
            .map(|pos| pos + 1)
    }

    /// Appends to a chain that has spare capacity.
    pub(crate) fn push(&mut self, chain: &mut Chain<K, V>, element: Element<K, V>) {
        match chain {
            Chain::Slab { region, len } => {
                assert!(*len < region.cap, "slab region overflow");
                self.slabs[region.slab].slots[region.start + *len] = Some(element);
                *len += 1;
            }
            Chain::Heap(vec) => vec.push(element),
        }
    }

    /// Removes the element at `pos`, shifting later elements left by one.
    /// The vacated tail slot is left empty.
    pub(crate) fn take(&mut self, chain: &mut Chain<K, V>, pos: usize) -> Option<Element<K, V>> {
        match chain {
            Chain::Slab { region, len } => {
                if pos >= *len {
                    return None;
                }
                let slab = self.slabs.get_mut(region.slab)?;
                let live = &mut slab.slots[region.start..region.start + *len];
                let element = live[pos].take();
                live[pos..].rotate_left(1);
                *len -= 1;
                element
            }
            Chain::Heap(vec) => (pos < vec.len()).then(|| vec.remove(pos)),
        }
    }

    /// Moves every element of `from` to the end of `to`, preserving order.
    pub(crate) fn transfer(&mut self, from: &mut Chain<K, V>, to: &mut Chain<K, V>) {
        while let Some(element) = self.take(from, 0) {
            self.push(to, element);
        }
    }

    /// Moves a slab chain into a heap vector of twice its capacity and frees
    /// the region. Heap chains are returned unchanged.
    pub(crate) fn spill(&mut self, mut chain: Chain<K, V>) -> Chain<K, V> {
        if let Chain::Heap(_) = chain {
            return chain;
        }
        let mut vec = Vec::with_capacity(chain.capacity() * 2);
        while let Some(element) = self.take(&mut chain, 0) {
            vec.push(element);
        }
        self.free_chain_buffer(chain);
        Chain::Heap(vec)
    }

    /// Halves the capacity of a heap chain. Slab regions keep their size.
    pub(crate) fn shrink(&mut self, chain: &mut Chain<K, V>) {
        if let Chain::Heap(vec) = chain {
            let target = vec.capacity() / 2;
            vec.shrink_to(target);
        }
    }

    /// Iterates every element held in slab storage, in slab order.
    pub(crate) fn slab_elements_mut(&mut self) -> SlabElementsMut<'_, K, V> {
        SlabElementsMut {
            slabs: self.slabs.values_mut(),
            slots: Default::default(),
        }
    }

    pub(crate) fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    pub(crate) fn free_buffers(&self) -> usize {
        self.free.len()
    }
}

/// Elements of one chain, in slot order.
pub(crate) enum Elements<'a, K, V> {
    Slab(Flatten<slice::Iter<'a, Option<Element<K, V>>>>),
    Heap(slice::Iter<'a, Element<K, V>>),
}

impl<'a, K, V> Iterator for Elements<'a, K, V> {
    type Item = &'a Element<K, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Elements::Slab(it) => it.next(),
            Elements::Heap(it) => it.next(),
        }
    }
}

pub(crate) struct SlabElementsMut<'a, K, V> {
    slabs: slotmap::basic::ValuesMut<'a, SlabKey, Slab<K, V>>,
    slots: slice::IterMut<'a, Option<Element<K, V>>>,
}

impl<'a, K, V> Iterator for SlabElementsMut<'a, K, V> {
    type Item = &'a mut Element<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(slot) = self.slots.next() {
                if let Some(element) = slot.as_mut() {
                    return Some(element);
                }
                continue;
            }
            let slab = self.slabs.next()?;
            self.slots = slab.slots.iter_mut();
        }
    }
}
