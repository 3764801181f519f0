// ChainedHashMap property tests (public API only).
//
// Property 1: growth keeps every live record reachable.
//  - Model: insertion-ordered Vec of (key, value, handle) for distinct keys.
//  - Invariant: after each insert, every earlier key is findable with its
//    value and its handle still resolves to the same record.
//
// Property 2: copies are independent.
//  - Mutations applied to a clone never show up in the source and the
//    source's iteration order is unchanged.
use chained_hashmap::{ChainedHashMap, Handle, MIN_SPACE};
use proptest::prelude::*;
use std::collections::BTreeSet;

proptest! {
    #[test]
    fn prop_growth_preserves_records(keys in proptest::collection::btree_set(any::<u64>(), 1..400)) {
        let keys: Vec<u64> = keys.into_iter().collect();
        let mut m: ChainedHashMap<u64, u64> = ChainedHashMap::new();
        let mut inserted: Vec<(u64, Handle)> = Vec::new();

        for &k in &keys {
            let before = m.bucket_count();
            let h = m.insert(k, k.wrapping_mul(3));
            inserted.push((k, h));

            // Growth happens exactly when the post-insert count exceeds 2 * space.
            if m.len() > 2 * before {
                prop_assert_eq!(m.bucket_count(), 2 * before);
            } else {
                prop_assert_eq!(m.bucket_count(), before);
            }
        }

        prop_assert!(m.bucket_count() >= MIN_SPACE);
        prop_assert!(m.len() <= 2 * m.bucket_count());
        for (k, h) in &inserted {
            let expected = k.wrapping_mul(3);
            prop_assert_eq!(m.get(k), Some(&expected));
            prop_assert_eq!(h.key(&m), Some(k));
            prop_assert_eq!(m.find(k), Some(*h));
        }
        let order: Vec<u64> = m.keys().copied().collect();
        prop_assert_eq!(order, keys);
    }

    #[test]
    fn prop_clone_is_independent(
        keys in proptest::collection::vec(0u8..32, 0..120),
        erase in proptest::collection::vec(0u8..32, 0..40),
    ) {
        let source: ChainedHashMap<u8, usize> =
            keys.iter().enumerate().map(|(i, &k)| (k, i)).collect();
        let snapshot: Vec<(u8, usize)> = source.iter().map(|(k, v)| (*k, *v)).collect();

        let mut copy = source.clone();
        for k in &erase {
            copy.erase(k);
        }
        for v in copy.values_mut() {
            *v += 1_000;
        }
        copy.insert(255, 0);

        let after: Vec<(u8, usize)> = source.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(after, snapshot);
        prop_assert!(!source.contains_key(&255));

        let erased: BTreeSet<u8> = erase.iter().copied().collect();
        for (k, v) in copy.iter() {
            prop_assert!(*v >= 1_000 || *k == 255);
            if *k != 255 && !erased.contains(k) {
                prop_assert!(source.contains_key(k));
            }
        }
    }
}
