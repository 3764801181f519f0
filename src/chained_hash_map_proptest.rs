#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can call
// the structural invariant check.

use crate::chained_hash_map::{ChainedHashMap, Handle, KeyNotFound};
use crate::MIN_SPACE;
use core::hash::BuildHasher;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::Hasher;

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Subscript(usize, i32),
    Erase(usize),
    Find(usize),
    At(usize),
    RemoveHandle(usize),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=12).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => (idx.clone(), -100i32..100).prop_map(|(i, d)| Op::Subscript(i, d)),
            2 => idx.clone().prop_map(Op::Erase),
            2 => idx.clone().prop_map(Op::Find),
            1 => idx.clone().prop_map(Op::At),
            1 => any::<usize>().prop_map(Op::RemoveHandle),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..300).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Reference model: a plain vector of `(id, key, value)` in insertion order.
/// Key-based operations act on the first element with a matching key.
struct Model {
    entries: Vec<(u64, String, i32)>,
    next_id: u64,
}

impl Model {
    fn first(&self, k: &str) -> Option<usize> {
        self.entries.iter().position(|(_, ek, _)| ek == k)
    }
    fn push(&mut self, k: String, v: i32) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, k, v));
        id
    }
}

// Property: state-machine equivalence against the vector model.
// Invariants exercised across random operation sequences:
// - Iteration order equals insertion order of live records, duplicates included.
// - `find`/`at`/`erase`/subscript resolve to the oldest record with the key.
// - Handles of live records keep resolving across growth; erased ones never do.
// - Bucket/store agreement holds after every operation.
fn run_scenario<S>(hasher: S, pool: Vec<String>, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut sut: ChainedHashMap<String, i32, S> = ChainedHashMap::with_hasher(hasher);
    let mut model = Model {
        entries: Vec::new(),
        next_id: 0,
    };
    let mut live: HashMap<u64, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                let h = sut.insert(k.clone(), v);
                let id = model.push(k, v);
                live.insert(id, h);
            }
            Op::Subscript(i, d) => {
                let k = pool[i].clone();
                let slot = sut.get_or_insert_default(k.clone());
                *slot = slot.saturating_add(d);
                match model.first(&k) {
                    Some(pos) => {
                        let mv = &mut model.entries[pos].2;
                        *mv = mv.saturating_add(d);
                    }
                    None => {
                        let id = model.push(k.clone(), d);
                        let h = sut.find(&k).expect("subscript inserted the key");
                        live.insert(id, h);
                    }
                }
            }
            Op::Erase(i) => {
                let k = &pool[i];
                let got = sut.erase(k.as_str());
                match model.first(k) {
                    Some(pos) => {
                        let (id, mk, mv) = model.entries.remove(pos);
                        prop_assert_eq!(got, Some((mk, mv)));
                        stale.extend(live.remove(&id));
                    }
                    None => prop_assert_eq!(got, None),
                }
            }
            Op::Find(i) => {
                let k = &pool[i];
                let got = sut.find(k.as_str());
                let expected = model.first(k).map(|pos| live[&model.entries[pos].0]);
                prop_assert_eq!(got, expected);
            }
            Op::At(i) => {
                let k = &pool[i];
                let got = sut.at(k.as_str());
                match model.first(k) {
                    Some(pos) => prop_assert_eq!(got, Ok(&model.entries[pos].2)),
                    None => prop_assert_eq!(got, Err(KeyNotFound)),
                }
            }
            Op::RemoveHandle(n) => {
                if !model.entries.is_empty() {
                    let pos = n % model.entries.len();
                    let (id, mk, mv) = model.entries.remove(pos);
                    let h = live.remove(&id).expect("tracked handle");
                    prop_assert_eq!(sut.remove_handle(h), Some((mk, mv)));
                    stale.push(h);
                }
            }
            Op::Clear => {
                sut.clear();
                model.entries.clear();
                stale.extend(live.drain().map(|(_, h)| h));
                prop_assert_eq!(sut.bucket_count(), MIN_SPACE);
            }
            Op::Iterate => {
                let got: Vec<(String, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let want: Vec<(String, i32)> =
                    model.entries.iter().map(|(_, k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(got, want);
            }
        }

        // Post-conditions after each op
        prop_assert!(sut.check_invariants());
        prop_assert!(sut.check_cached_hashes());
        prop_assert_eq!(sut.len(), model.entries.len());
        prop_assert_eq!(sut.is_empty(), model.entries.is_empty());
        for (id, _, v) in &model.entries {
            prop_assert_eq!(live[id].value(&sut), Some(v));
        }
        for h in &stale {
            prop_assert!(h.value(&sut).is_none());
        }
    }

    // A copy taken at the end matches the original record for record.
    let copy = sut.clone();
    prop_assert!(copy.check_invariants());
    prop_assert!(copy.check_cached_hashes());
    prop_assert!(copy.iter().eq(sut.iter()));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(RandomState::new(), pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants under worst-case collisions, where every record
// shares bucket 0 and lookups rely entirely on key equality.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(ConstBuildHasher, pool, ops)?;
    }
}
