#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can check
// structural invariants (bucket placement, pool accounting) after every step.

use crate::chained_hash_map::ChainedHashMap;
use crate::config::MapConfig;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking converges on earlier keys.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Get(usize),
    Del(usize),
    Remove(usize),
    Contains(String),
    Mutate(usize, i32),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Get),
            2 => idx.clone().prop_map(OpI::Del),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drive `sut` and a std HashMap model through `ops`, checking after each op:
// - put returns the previous value and never duplicates a key;
// - get/contains/del/remove agree with the model;
// - every node sits in the bucket its stored hash selects, len() equals the
//   reachable node count, and the pool's live count equals len();
// - Display lists exactly the model's entries.
fn run_state_machine<S>(
    mut sut: ChainedHashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = key_from(pool, i);
                let prev = sut.put(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k, v));
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Del(i) => {
                let k = key_from(pool, i);
                let before = sut.len();
                let removed = sut.del(&k);
                prop_assert_eq!(removed, model.remove(&k).is_some());
                prop_assert_eq!(sut.len(), if removed { before - 1 } else { before });
                prop_assert!(!sut.contains_key(&k));
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(k.0.as_str()), model.remove(&k));
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.wrapping_add(d);
                        *mv = mv.wrapping_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys.len(), sut.len(), "iter yields each key once");
                prop_assert_eq!(s_keys, m_keys);
                for (k, v) in &sut {
                    prop_assert_eq!(Some(v), model.get(k));
                }
            }
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity().is_power_of_two());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(ChainedHashMap::new(), &pool, ops)?;
    }

    // Tiny table and pool blocks: resizes and bulk releases happen constantly.
    #[test]
    fn prop_state_machine_small_pool((pool, ops) in arb_scenario()) {
        let config = MapConfig::default()
            .with_initial_capacity(1)
            .with_block_size(2)
            .with_release_factor(1.0);
        run_state_machine(ChainedHashMap::with_config(config).unwrap(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares one chain.
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(ChainedHashMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }

    // Resize keeps every entry and keeps each chain's relative order.
    #[test]
    fn prop_resize_preserves_entries(keys in proptest::collection::hash_set(any::<u32>(), 0..600)) {
        let mut sut: ChainedHashMap<u32, u32> = ChainedHashMap::with_capacity(1);
        for &k in &keys {
            sut.put(k, k.wrapping_mul(3));
        }
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), keys.len());
        for &k in &keys {
            prop_assert_eq!(sut.get(&k), Some(&k.wrapping_mul(3)));
        }
        prop_assert!(sut.len() <= sut.threshold() || sut.threshold() == usize::MAX);
    }
}
