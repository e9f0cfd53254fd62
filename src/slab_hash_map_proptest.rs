#![cfg(test)]

// Property tests for SlabHashMap kept inside the crate so they can check
// allocator-level invariants that the public API does not expose.

use crate::hashing::equal;
use crate::{Entry, FnOps, SlabHashMap};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

type Map = SlabHashMap<String, i32, FnOps<fn(&String, &String) -> bool, fn(&String) -> u64>>;

// Deliberately weak so that a handful of buckets sees long chains.
fn byte_sum(k: &String) -> u64 {
    k.bytes().map(u64::from).sum()
}

fn zero(_: &String) -> u64 {
    0
}

fn new_map(buckets: usize, hash: fn(&String) -> u64) -> Map {
    let eq: fn(&String, &String) -> bool = equal::<String>;
    SlabHashMap::with_bucket_count(eq, hash, buckets)
}

// Pool-indexed operations: indices shrink to earlier keys, the pool shrinks,
// and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Upsert(usize, i32),
    Entry(usize, i32),
    Remove(usize),
    Get(usize),
    Mutate(usize, i32),
    CursorRemoveOdd,
    Retain(i32),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,6}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            3 => (idx.clone(), -100i32..100).prop_map(|(i, d)| Op::Upsert(i, d)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Entry(i, v)),
            4 => idx.clone().prop_map(Op::Remove),
            3 => idx.clone().prop_map(Op::Get),
            2 => (idx.clone(), -100i32..100).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::CursorRemoveOdd),
            1 => (0i32..4).prop_map(Op::Retain),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_scenario(mut sut: Map, pool: &[String], ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                prop_assert_eq!(sut.insert(k.clone(), v), model.insert(k, v));
            }
            Op::Upsert(i, d) => {
                let k = pool[i].clone();
                let existed = model.contains_key(&k);
                let mut calls = 0;
                sut.upsert(k.clone(), |e, exists| {
                    calls += 1;
                    assert_eq!(exists, existed);
                    let v = e.value_mut();
                    *v = v.saturating_add(d);
                });
                prop_assert_eq!(calls, 1, "upsert must call back exactly once");
                let mv = model.entry(k).or_default();
                *mv = mv.saturating_add(d);
            }
            Op::Entry(i, v) => {
                let k = pool[i].clone();
                match sut.entry(k.clone()) {
                    Entry::Occupied(o) => {
                        prop_assert_eq!(Some(o.get()), model.get(&k));
                        let removed = o.remove();
                        prop_assert_eq!(Some(removed), model.remove(&k));
                    }
                    Entry::Vacant(slot) => {
                        prop_assert!(!model.contains_key(&k));
                        slot.insert(v);
                        model.insert(k, v);
                    }
                }
            }
            Op::Remove(i) => {
                let k = &pool[i];
                let got = sut.remove(k);
                let expected = model.remove(k).map(|v| (k.clone(), v));
                prop_assert_eq!(got, expected);
            }
            Op::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            Op::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k), model.get_mut(k)) {
                    (Some(v), Some(mv)) => {
                        *v = v.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            Op::CursorRemoveOdd => {
                let mut visited = BTreeSet::new();
                let mut cursor = sut.cursor();
                while cursor.move_next() {
                    let k = cursor.current().key().clone();
                    prop_assert!(visited.insert(k.clone()), "cursor visited {:?} twice", k);
                    if cursor.current().value() % 2 != 0 {
                        let (rk, _) = cursor.remove_current();
                        prop_assert_eq!(&rk, &k);
                    }
                }
                let model_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(visited, model_keys);
                model.retain(|_, v| *v % 2 == 0);
            }
            Op::Retain(m) => {
                sut.retain(|_, v| v.rem_euclid(4) != m);
                model.retain(|_, v| v.rem_euclid(4) != m);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.allocator_stats().occupied_buckets, 0);
            }
            Op::Iterate => {
                let s: BTreeMap<_, _> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m: BTreeMap<_, _> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s, m);
                prop_assert_eq!(sut.iter_mut().count(), model.len());
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        sut.assert_invariants();
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert/remove/get/upsert/entry results match the model.
// - The cursor visits each live entry exactly once while removing.
// - `len` equals the sum of chain lengths; each element sits in the bucket
//   its cached hash selects; slab slots hold exactly the slab-resident
//   elements; the free list stays bounded.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), buckets in 1usize..=16) {
        run_scenario(new_map(buckets, byte_sum), &pool, ops)?;
    }
}

// Property: same invariants when every key collides into one chain, which
// drives chains through slab growth, heap spill and shrink.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(new_map(3, zero), &pool, ops)?;
    }
}
