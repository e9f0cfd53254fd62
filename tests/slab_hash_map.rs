// SlabHashMap unit test suite (public API).
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Absence: lookups and removals of missing keys change nothing.
// - Overwrite: inserting an existing key replaces the value in place.
// - Upsert: the callback runs once and sees whether the key existed.
// - Collisions: keys sharing a bucket are resolved by equality alone.
// - Clear: every entry is gone and the map is reusable.
use slab_hashmap::hashing::{equal, new_hasher};
use slab_hashmap::{ConfigError, Entry, FnOps, MapConfig, SlabHashMap, StdOps, DEFAULT_BUCKET_COUNT};

type StrMap = SlabHashMap<String, i32, FnOps<fn(&String, &String) -> bool, fn(&String) -> u64>>;

fn first_byte(k: &String) -> u64 {
    k.bytes().next().map_or(0, u64::from)
}

fn str_map(buckets: usize) -> StrMap {
    let eq: fn(&String, &String) -> bool = equal::<String>;
    let hash: fn(&String) -> u64 = first_byte;
    SlabHashMap::with_bucket_count(eq, hash, buckets)
}

fn s(k: &str) -> String {
    k.to_string()
}

// Test: small table walkthrough.
// Assumes: bucket count 4 and any hash function.
// Verifies: len, get and remove on three keys behave as a map.
#[test]
fn four_bucket_walkthrough() {
    let mut m = SlabHashMap::with_bucket_count(equal::<String>, new_hasher::<String>(), 4);
    m.insert(s("a"), 1);
    m.insert(s("b"), 2);
    m.insert(s("c"), 3);
    assert_eq!(m.len(), 3);
    assert_eq!(m.get(&s("a")), Some(&1));
    assert_eq!(m.remove(&s("b")), Some((s("b"), 2)));
    assert_eq!(m.len(), 2);
    assert_eq!(m.get(&s("b")), None);
}

// Test: absent keys.
// Assumes: keys never inserted.
// Verifies: get/remove report absence and len is unchanged.
#[test]
fn absent_keys_are_not_found() {
    let mut m = str_map(8);
    m.insert(s("present"), 1);
    assert_eq!(m.get(&s("missing")), None);
    assert_eq!(m.remove(&s("missing")), None);
    assert!(!m.contains_key(&s("pizza")));
    assert_eq!(m.len(), 1);
}

// Test: overwrite.
// Assumes: the same key is inserted twice.
// Verifies: len is unchanged, the second value wins, the first is returned.
#[test]
fn insert_overwrites_in_place() {
    let mut m = str_map(8);
    assert_eq!(m.insert(s("k"), 1), None);
    assert_eq!(m.insert(s("k"), 2), Some(1));
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(&s("k")), Some(&2));
    assert_eq!(m.get_key_value(&s("k")), Some((&s("k"), &2)));
}

// Test: upsert contract.
// Assumes: V: Default seeds missing entries.
// Verifies: exists flag, current value visibility, len grows only on insert.
#[test]
fn upsert_reports_existence() {
    let mut m = str_map(8);
    m.upsert(s("k"), |e, exists| {
        assert!(!exists);
        assert_eq!(*e.value(), 0);
        *e.value_mut() = 5;
    });
    assert_eq!(m.len(), 1);
    m.upsert(s("k"), |e, exists| {
        assert!(exists);
        assert_eq!(e.key(), "k");
        assert_eq!(*e.value(), 5);
        *e.value_mut() += 1;
    });
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(&s("k")), Some(&6));
}

// Test: double remove.
// Assumes: one insert followed by two removes.
// Verifies: first remove returns the pair, second reports absence.
#[test]
fn remove_twice() {
    let mut m = str_map(8);
    m.insert(s("k"), 9);
    assert_eq!(m.remove(&s("k")), Some((s("k"), 9)));
    assert_eq!(m.len(), 0);
    assert_eq!(m.remove(&s("k")), None);
    assert_eq!(m.len(), 0);
}

// Test: remove_entry returns the stored element.
// Assumes: the hash cached at insertion is kept.
// Verifies: element key/value/hash match what was inserted.
#[test]
fn remove_entry_keeps_cached_hash() {
    let mut m = str_map(8);
    m.insert(s("abc"), 1);
    let e = m.remove_entry(&s("abc")).expect("present");
    assert_eq!(e.hash(), u64::from(b'a'));
    assert_eq!(e.into_parts(), (s("abc"), 1));
}

// Test: clear.
// Assumes: a map with entries spread over many chain shapes.
// Verifies: len is zero, nothing is found, and the map accepts new entries.
#[test]
fn clear_removes_everything() {
    let mut m = str_map(3);
    let keys: Vec<String> = (0..200).map(|i| format!("{}{i}", (b'a' + (i % 26) as u8) as char)).collect();
    for (i, k) in keys.iter().enumerate() {
        m.insert(k.clone(), i as i32);
    }
    assert_eq!(m.len(), 200);
    m.clear();
    assert_eq!(m.len(), 0);
    assert!(m.is_empty());
    assert!(keys.iter().all(|k| m.get(k).is_none()));
    assert_eq!(m.iter().count(), 0);

    m.insert(s("again"), 1);
    assert_eq!(m.get(&s("again")), Some(&1));
}

// Test: collision handling.
// Assumes: keys starting with the same byte share a bucket.
// Verifies: each is independently retrievable and removable.
#[test]
fn colliding_keys_are_independent() {
    let mut m = str_map(1);
    let keys = ["apple", "avocado", "apricot", "almond", "anise", "acai"];
    for (i, k) in keys.iter().enumerate() {
        m.insert(s(k), i as i32);
    }
    for (i, k) in keys.iter().enumerate() {
        assert_eq!(m.get(&s(k)), Some(&(i as i32)));
    }
    assert_eq!(m.remove(&s("apricot")), Some((s("apricot"), 2)));
    assert_eq!(m.get(&s("apricot")), None);
    for k in ["apple", "avocado", "almond", "anise", "acai"] {
        assert!(m.contains_key(&s(k)), "{k} lost after unrelated removal");
    }
    assert_eq!(m.len(), 5);
}

// Test: entry API.
// Assumes: counting words through or_insert.
// Verifies: occupied and vacant paths both land on the right slot.
#[test]
fn entry_counts_words() {
    let mut m = str_map(4);
    for w in "the cat saw the other cat near the mat".split(' ') {
        *m.entry(s(w)).or_insert(0) += 1;
    }
    assert_eq!(m.get(&s("the")), Some(&3));
    assert_eq!(m.get(&s("cat")), Some(&2));
    assert_eq!(m.get(&s("mat")), Some(&1));
    assert_eq!(m.len(), 6);

    match m.entry(s("dog")) {
        Entry::Vacant(v) => assert_eq!(v.key(), "dog"),
        Entry::Occupied(_) => panic!("dog was never inserted"),
    }
    assert_eq!(m.len(), 6);
}

// Test: iteration helpers.
// Assumes: values mutated through values_mut and IntoIterator for &mut.
// Verifies: keys/values/iter agree and mutations stick.
#[test]
fn iteration_helpers_agree() {
    let mut m = str_map(5);
    m.extend((0..30).map(|i| (format!("k{i}"), i)));
    for v in m.values_mut() {
        *v *= 2;
    }
    for (_, v) in &mut m {
        *v += 1;
    }
    let mut pairs: Vec<(String, i32)> = (&m).into_iter().map(|(k, v)| (k.clone(), *v)).collect();
    pairs.sort();
    let mut expected: Vec<(String, i32)> = (0..30).map(|i| (format!("k{i}"), i * 2 + 1)).collect();
    expected.sort();
    assert_eq!(pairs, expected);
    assert_eq!(m.keys().count(), 30);
    assert_eq!(m.values().copied().sum::<i32>(), expected.iter().map(|(_, v)| v).sum::<i32>());
    assert_eq!(m.iter().len(), 30);
}

// Test: std-backed construction.
// Assumes: K: Hash + Eq keys with StdOps.
// Verifies: default and configured maps behave as maps.
#[test]
fn std_ops_maps() {
    let mut m: SlabHashMap<(u32, String), u8> = SlabHashMap::with_config(MapConfig::with_bucket_count(32).unwrap());
    m.insert((1, s("x")), 1);
    m.insert((1, s("y")), 2);
    assert_eq!(m.get(&(1, s("y"))), Some(&2));
    assert_eq!(m.bucket_count(), 32);

    let d: SlabHashMap<u64, u64> = SlabHashMap::default();
    assert_eq!(d.bucket_count(), DEFAULT_BUCKET_COUNT);

    let mut w = SlabHashMap::with_ops(StdOps::new(), MapConfig::default());
    w.insert("k", "v");
    assert_eq!(w.get(&"k"), Some(&"v"));
}

// Test: construction overrides.
// Assumes: the optional trailing bucket count.
// Verifies: none selects the default, one is used, more is rejected.
#[test]
fn construction_overrides() {
    let eq: fn(&String, &String) -> bool = equal::<String>;
    let hash: fn(&String) -> u64 = first_byte;
    let m: StrMap = SlabHashMap::try_with_overrides(eq, hash, &[]).unwrap();
    assert_eq!(m.bucket_count(), DEFAULT_BUCKET_COUNT);
    let m: StrMap = SlabHashMap::try_with_overrides(eq, hash, &[7]).unwrap();
    assert_eq!(m.bucket_count(), 7);
    let e = StrMap::try_with_overrides(eq, hash, &[7, 8]).err();
    assert_eq!(e, Some(ConfigError::TooManyBucketCounts(2)));
}

#[test]
#[should_panic(expected = "bucket count must be non-zero")]
fn zero_buckets_panics() {
    let _ = str_map(0);
}
