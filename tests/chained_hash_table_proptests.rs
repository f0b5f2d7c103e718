use chained_hash_table::ChainedHashTable;
use proptest::prelude::*;
use std::collections::HashMap;

// Model random insert/remove sequences over a small key space and assert
// size, presence and values match a std HashMap after every step.
proptest! {
    #[test]
    fn prop_matches_std_hashmap(capacity in 1usize..=4, ops in proptest::collection::vec((any::<bool>(), 0u16..64, any::<u32>()), 1..200)) {
        let mut t: ChainedHashTable<u16, u32> = ChainedHashTable::with_capacity(capacity).unwrap();
        let mut model: HashMap<u16, u32> = HashMap::new();

        for (is_insert, k, v) in ops {
            if is_insert {
                prop_assert_eq!(t.insert(k, v), model.insert(k, v));
            } else {
                let before = t.len();
                let removed = t.remove(&k);
                prop_assert_eq!(removed, model.remove(&k));
                // Removing an absent key never changes the size.
                if removed.is_none() {
                    prop_assert_eq!(t.len(), before);
                }
            }

            prop_assert_eq!(t.len(), model.len());
            prop_assert_eq!(t.get(&k), model.get(&k));
        }

        // Final invariant: iteration sees exactly the model's entries.
        prop_assert_eq!(t.iter().count(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(t.get(k), Some(v));
        }
    }
}

// Bucket placement follows `bucket_index` for every stored key, before and
// after growth.
proptest! {
    #[test]
    fn prop_keys_live_in_their_bucket(keys in proptest::collection::vec(any::<i64>(), 1..100)) {
        let mut t = ChainedHashTable::with_capacity(3).unwrap();
        for k in &keys {
            t.insert(*k, ());
            let b = t.bucket_index(k);
            let chain = t.bucket(b).expect("bucket in range");
            prop_assert!(chain.map(|(key, _)| key).any(|key| key == k));
        }
        for k in &keys {
            prop_assert!(t.bucket_index(k) < t.capacity());
        }
    }
}
