//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store and the eviction list against simple
//! models built from std collections.

use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};

use crate::cache::{CacheStore, EvictionList, NodeRef, DEFAULT_NAMESPACE};
use crate::error::CacheError;

// == Test Configuration ==
const TEST_DEFAULT_TTL: u64 = 300;

// == Strategies ==
/// Small key space so that sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

#[derive(Debug, Clone)]
enum ListOp {
    Insert(u8),
    Touch(usize),
    RemoveTail,
    Remove(usize),
    Clear,
}

fn list_op_strategy() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        4 => any::<u8>().prop_map(ListOp::Insert),
        3 => any::<usize>().prop_map(ListOp::Touch),
        2 => Just(ListOp::RemoveTail),
        2 => any::<usize>().prop_map(ListOp::Remove),
        1 => Just(ListOp::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Len always equals the number of distinct live keys, values read back
    // are the last ones written, and the structures stay consistent.
    #[test]
    fn prop_store_matches_model(
        ops in prop::collection::vec(cache_op_strategy(), 1..80),
        size in 1usize..12,
        window in 0usize..6,
    ) {
        let mut store = CacheStore::new(size, window, TEST_DEFAULT_TTL);
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    let result = store.set(DEFAULT_NAMESPACE, &key, &value, 0);
                    if model.contains_key(&key) || model.len() < size {
                        prop_assert!(result.is_ok());
                        model.insert(key, value);
                    } else {
                        prop_assert!(matches!(result, Err(CacheError::CacheFull(_))));
                    }
                }
                CacheOp::Get { key } => {
                    let found: Option<String> = store.get(DEFAULT_NAMESPACE, &key).unwrap();
                    prop_assert_eq!(found.as_ref(), model.get(&key));
                }
                CacheOp::Remove { key } => {
                    let removed = store.remove(DEFAULT_NAMESPACE, &key);
                    prop_assert_eq!(removed, model.remove(&key).is_some());
                }
            }

            prop_assert_eq!(store.len(), model.len());
            prop_assert!(store.len() <= size);
            prop_assert!(store.eviction_keys().len() <= window);
            if let Err(msg) = store.check_integrity() {
                prop_assert!(false, "integrity violated: {}", msg);
            }
        }
    }

    // Purge always leaves nothing behind, whatever came before.
    #[test]
    fn prop_purge_empties_store(
        ops in prop::collection::vec(cache_op_strategy(), 0..40),
        namespaced in prop::collection::vec(key_strategy(), 0..10),
    ) {
        let mut store = CacheStore::new(64, 4, TEST_DEFAULT_TTL);
        for op in ops {
            if let CacheOp::Set { key, value } = op {
                store.set(DEFAULT_NAMESPACE, &key, &value, 0).unwrap();
            }
        }
        for key in namespaced {
            store.set("sessions", &key, &1u8, 0).unwrap();
        }

        store.purge();

        prop_assert_eq!(store.len(), 0);
        prop_assert!(store.keys().is_empty());
        prop_assert!(store.eviction_keys().is_empty());
        prop_assert!(store.check_integrity().is_ok());
    }

    // The eviction list behaves like a bounded deque ordered by recency.
    #[test]
    fn prop_eviction_list_matches_deque(
        ops in prop::collection::vec(list_op_strategy(), 1..120),
        capacity in 0usize..8,
    ) {
        let mut list = EvictionList::new(capacity);
        // front = most recent
        let mut model: VecDeque<(String, NodeRef)> = VecDeque::new();
        let mut next_id = 0u32;

        for op in ops {
            match op {
                ListOp::Insert(tag) => {
                    let key = format!("{tag}-{next_id}");
                    next_id += 1;
                    match list.insert_head(key.clone()) {
                        Ok(node) => {
                            prop_assert!(model.len() < capacity);
                            model.push_front((key, node));
                        }
                        Err(err) => {
                            prop_assert!(matches!(err, CacheError::CapacityExceeded(_)));
                            prop_assert_eq!(model.len(), capacity);
                        }
                    }
                }
                ListOp::Touch(i) => {
                    if !model.is_empty() {
                        let item = model.remove(i % model.len()).unwrap();
                        prop_assert!(list.move_to_head(item.1));
                        model.push_front(item);
                    }
                }
                ListOp::RemoveTail => {
                    let expected = model.pop_back().map(|(key, _)| key);
                    prop_assert_eq!(list.remove_tail(), expected);
                }
                ListOp::Remove(i) => {
                    if !model.is_empty() {
                        let (key, node) = model.remove(i % model.len()).unwrap();
                        prop_assert_eq!(list.remove_node(node), Some(key));
                    }
                }
                ListOp::Clear => {
                    list.clear();
                    model.clear();
                }
            }

            let expected: Vec<String> = model.iter().map(|(key, _)| key.clone()).collect();
            prop_assert_eq!(list.keys(), expected);
            prop_assert_eq!(list.len(), model.len());
            prop_assert!(list.is_consistent());
        }
    }
}
