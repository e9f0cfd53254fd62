// Hash-mixing helper tests.
//
// Core invariants exercised:
// - combine_hash follows `seed ^ (hash + PRIME + (seed << 6) + (seed >> 2))`
//   with wrapping arithmetic.
// - combine_hashes folds from HASH_SEED in order.
// - Hashers built from field hashes drive a map over composite keys.
use slab_hashmap::hashing::{combine_hash, combine_hashes, equal, new_hasher, HASH_SEED, MIX_PRIME};
use slab_hashmap::SlabHashMap;

// Test: constants.
// Verifies: FNV-1a 64-bit offset basis and prime.
#[test]
fn constants_match_fnv() {
    assert_eq!(HASH_SEED, 0xcbf2_9ce4_8422_2325);
    assert_eq!(MIX_PRIME, 0x0000_0100_0000_01b3);
}

// Test: one combine step from the seed.
// Verifies: the formula evaluated by hand with wrapping adds.
#[test]
fn combine_from_seed() {
    let expected = HASH_SEED
        ^ 42u64
            .wrapping_add(MIX_PRIME)
            .wrapping_add(HASH_SEED << 6)
            .wrapping_add(HASH_SEED >> 2);
    assert_eq!(combine_hash(HASH_SEED, 42), expected);
    assert_eq!(combine_hashes([42]), expected);
}

// Test: fold semantics.
// Verifies: empty input yields the seed and folding is left-to-right.
#[test]
fn combine_hashes_folds_in_order() {
    assert_eq!(combine_hashes(Vec::new()), HASH_SEED);
    let hs = [7u64, u64::MAX, 0, 99];
    let manual = hs.iter().fold(HASH_SEED, |acc, h| combine_hash(acc, *h));
    assert_eq!(combine_hashes(hs), manual);
    assert_ne!(combine_hashes([1, 2]), combine_hashes([2, 1]));
}

// Test: composite keys.
// Assumes: a key built from a slice of strings plus an integer, hashed by
// combining per-field hashes.
// Verifies: structurally equal keys find each other; different ones do not.
#[test]
fn composite_keys_through_combined_hashes() {
    #[derive(Clone, PartialEq, Debug)]
    struct Path {
        segments: Vec<String>,
        version: u32,
    }

    let seg = new_hasher::<str>();
    let ver = new_hasher::<u32>();
    let hash = move |p: &Path| {
        let segs = combine_hashes(p.segments.iter().map(|s| seg(s.as_str())));
        combine_hashes([segs, ver(&p.version)])
    };
    let mut m = SlabHashMap::with_bucket_count(equal::<Path>, hash, 64);

    fn path(segments: &[&str], version: u32) -> Path {
        Path {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            version,
        }
    }

    m.insert(path(&["usr", "lib"], 1), "a");
    m.insert(path(&["usr", "lib"], 2), "b");
    m.insert(path(&["lib", "usr"], 1), "c");

    assert_eq!(m.len(), 3);
    assert_eq!(m.get(&path(&["usr", "lib"], 1)), Some(&"a"));
    assert_eq!(m.get(&path(&["usr", "lib"], 2)), Some(&"b"));
    assert_eq!(m.get(&path(&["lib", "usr"], 1)), Some(&"c"));
    assert_eq!(m.get(&path(&["usr"], 1)), None);
}

// Test: hasher factory.
// Verifies: one hasher is deterministic across calls and clones.
#[test]
fn hasher_is_deterministic_per_instance() {
    let h = new_hasher::<[u8]>();
    let c = h.clone();
    let inputs: [&[u8]; 3] = [b"", b"a", b"hello world"];
    for bytes in inputs {
        assert_eq!(h(bytes), h(bytes));
        assert_eq!(h(bytes), c(bytes));
    }
    assert_ne!(h(&b"a"[..]), h(&b"b"[..]));
}
