//! slab-hashmap: a fixed-bucket chained hash map over arbitrary keys, with
//! caller-supplied hash and equality functions and slab-backed chains.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a map for composite keys (sequences, nested records) that do not
//!   implement `Hash`/`Eq` the way the caller wants, with cheap short
//!   chains and a traversal that can delete as it goes.
//! - Layers:
//!   - `KeyOps<K>`: the hash/equality pair. `FnOps` wraps two closures,
//!     `StdOps` defers to `K: Hash + Eq` through a `BuildHasher`.
//!   - `SlabAllocator<K, V>`: owns slabs of element slots, carves small
//!     chain regions off them and recycles freed regions through a bounded
//!     free list.
//!   - `SlabHashMap<K, V, O>`: the bucket array. Each bucket is empty or
//!     holds one `Chain`, either a slab region or a heap vector.
//!   - `Entry`/`Cursor`: borrow-scoped handles for in-place update and for
//!     removal during traversal.
//!
//! Constraints
//! - Bucket count is fixed at construction; there is no rehash or resize.
//! - Bucket index is `hash % bucket_count`.
//! - Keys are unique under the supplied equality.
//! - Single-threaded; the map is `Send`/`Sync` only when its parts are.
//!
//! Chain growth
//! - A new chain gets a 1-slot region. While it holds fewer than three
//!   elements it grows into a 4-slot region; past that it spills into a
//!   heap vector of twice the capacity and doubles from there.
//! - Removing compacts the chain in order. An emptied chain goes back to
//!   the allocator; a heap chain whose length drops below a third of its
//!   capacity is shrunk to half.
//!
//! Hash invariants
//! - Each element stores the hash computed at insertion and lookups compare
//!   it before calling the equality function. The hash function is never
//!   called again for a stored key.
//!
//! Notes and non-goals
//! - No concurrent access, persistence, or ordering guarantees beyond
//!   "bucket order, then chain order" for `iter`.
//! - Elements may move on any mutation of their bucket; references into the
//!   map never outlive the borrow that produced them.

mod chain;
mod config;
mod cursor;
mod entry;
pub mod hashing;
mod key_ops;
mod slab;
mod slab_hash_map;
mod slab_hash_map_proptest;

// Public surface
pub use chain::Element;
pub use config::{ConfigError, MapConfig, DEFAULT_BUCKET_COUNT};
pub use cursor::Cursor;
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use key_ops::{FnOps, KeyOps, StdOps};
#[cfg(feature = "stats")]
pub use slab_hash_map::AllocatorStats;
pub use slab_hash_map::{Iter, IterMut, SlabHashMap};
