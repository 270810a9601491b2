//! ChainedHashMap: separate chaining over pooled nodes with Java-style resizing.

use crate::config::{
    threshold_for, ConfigError, MapConfig, DEFAULT_INITIAL_CAPACITY, MAXIMUM_CAPACITY,
};
use crate::hash::{bucket_index, make_hash};
use crate::node_pool::{NodeKey, NodePool, PoolStats};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;
use log::debug;
use slotmap::SecondaryMap;
use std::collections::hash_map::RandomState;

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    hash: u64,
    key: K,
    value: V,
    next: Option<NodeKey>,
}

/// Hash map with one singly linked chain per bucket.
///
/// Nodes live in a [`NodePool`] owned by the map; buckets and `next` links
/// are pool handles. The bucket count is always a power of two and doubles
/// once `len() > threshold()`, splitting every chain in place.
pub struct ChainedHashMap<K, V, S = RandomState> {
    hasher: S,
    table: Vec<Option<NodeKey>>,
    pool: NodePool<Node<K, V>>,
    size: usize,
    threshold: usize,
    load_factor: f32,
}

impl<K, V> ChainedHashMap<K, V, RandomState> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Create a map with at least `n` buckets (rounded up to a power of two).
    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_and_hasher(n, RandomState::new())
    }

    pub fn with_config(config: MapConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V> Default for ChainedHashMap<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

/// Chain under construction during a resize split.
#[derive(Default)]
struct SplitChain {
    head: Option<NodeKey>,
    tail: Option<NodeKey>,
}

impl SplitChain {
    fn push<K, V>(&mut self, pool: &mut NodePool<Node<K, V>>, key: NodeKey) {
        match self.tail {
            None => self.head = Some(key),
            Some(t) => pool[t].next = Some(key),
        }
        self.tail = Some(key);
    }

    fn finish<K, V>(self, pool: &mut NodePool<Node<K, V>>) -> Option<NodeKey> {
        if let Some(t) = self.tail {
            pool[t].next = None;
        }
        self.head
    }
}

/// Capacity and threshold after one growth step, or `None` when the table is
/// already at [`MAXIMUM_CAPACITY`].
///
/// The threshold is doubled along with the capacity once the table has
/// reached the default size; below that, or when doubling would hit the
/// ceiling, it is recomputed from the load factor.
pub(crate) fn grown_size(
    old_cap: usize,
    old_thr: usize,
    load_factor: f32,
) -> Option<(usize, usize)> {
    if old_cap >= MAXIMUM_CAPACITY {
        return None;
    }
    let new_cap = old_cap << 1;
    let mut new_thr = 0;
    if new_cap < MAXIMUM_CAPACITY && old_cap >= DEFAULT_INITIAL_CAPACITY {
        new_thr = old_thr << 1;
    }
    if new_thr == 0 {
        new_thr = threshold_for(new_cap, load_factor);
    }
    Some((new_cap, new_thr))
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_config(MapConfig::default(), hasher)
    }

    pub fn with_capacity_and_hasher(n: usize, hasher: S) -> Self {
        Self::from_config(MapConfig::default().with_initial_capacity(n), hasher)
    }

    pub fn with_config_and_hasher(config: MapConfig, hasher: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_config(config, hasher))
    }

    fn from_config(config: MapConfig, hasher: S) -> Self {
        let capacity = config.table_capacity();
        Self {
            hasher,
            table: vec![None; capacity],
            pool: NodePool::new(config.block_size, config.release_factor),
            size: 0,
            threshold: threshold_for(capacity, config.load_factor),
            load_factor: config.load_factor,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    /// Entry count above which the next insert grows the table.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Return every node to the pool. The bucket count is kept.
    pub fn clear(&mut self) {
        for slot in self.table.iter_mut() {
            let mut cur = slot.take();
            while let Some(k) = cur {
                cur = self.pool.deallocate(k).and_then(|n| n.next);
            }
        }
        self.size = 0;
    }

    /// Entries in bucket order, then chain order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.table.iter(),
            pool: &self.pool,
            cur: None,
            remaining: self.size,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Mutable entries in the same bucket-then-chain order as
    /// [`iter`](Self::iter).
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let order = self.chain_order();
        let mut nodes = SecondaryMap::with_capacity(self.size);
        for (k, node) in self.pool.iter_mut() {
            nodes.insert(k, node);
        }
        IterMut {
            order: order.into_iter(),
            nodes,
        }
    }

    /// Node handles in bucket order, then chain order.
    fn chain_order(&self) -> Vec<NodeKey> {
        let mut order = Vec::with_capacity(self.size);
        for slot in &self.table {
            let mut cur = *slot;
            while let Some(k) = cur {
                order.push(k);
                cur = self.pool[k].next;
            }
        }
        order
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    /// Double the bucket count, relinking every node into its new bucket.
    fn resize(&mut self) {
        let grown = grown_size(self.table.len(), self.threshold, self.load_factor);
        self.apply_growth(grown);
    }

    /// Relink into a `new_cap`-bucket table, or pin the threshold to
    /// `usize::MAX` when `grown` is `None` (table already at its ceiling).
    fn apply_growth(&mut self, grown: Option<(usize, usize)>) {
        let old_cap = self.table.len();
        let Some((new_cap, new_thr)) = grown else {
            self.threshold = usize::MAX;
            debug!("table at maximum capacity {old_cap}; growth disabled");
            return;
        };

        let old_table = mem::replace(&mut self.table, vec![None; new_cap]);
        for (i, slot) in old_table.into_iter().enumerate() {
            let Some(head) = slot else { continue };
            let first = &self.pool[head];
            if first.next.is_none() {
                self.table[bucket_index(first.hash, new_cap)] = Some(head);
                continue;
            }

            // Doubling adds one index bit (`old_cap`); nodes with it clear
            // stay at `i`, the rest move to `i + old_cap`.
            let mut lo = SplitChain::default();
            let mut hi = SplitChain::default();
            let mut cur = Some(head);
            while let Some(k) = cur {
                let node = &self.pool[k];
                cur = node.next;
                if node.hash & old_cap as u64 == 0 {
                    lo.push(&mut self.pool, k);
                } else {
                    hi.push(&mut self.pool, k);
                }
            }
            self.table[i] = lo.finish(&mut self.pool);
            self.table[i + old_cap] = hi.finish(&mut self.pool);
        }

        debug!(
            "resized table {old_cap} -> {new_cap} buckets, threshold {} -> {new_thr} ({} entries)",
            self.threshold, self.size
        );
        self.threshold = new_thr;
    }

    fn record_insert(&mut self) {
        self.size += 1;
        if self.size > self.threshold {
            self.resize();
        }
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Insert or overwrite. Returns the previous value when `key` was present;
    /// the existing node is updated in place and `len()` does not change.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let hash = make_hash(&self.hasher, &key);
        let idx = bucket_index(hash, self.table.len());

        let Some(mut tail) = self.table[idx] else {
            let fresh = self.pool.emplace(Node {
                hash,
                key,
                value,
                next: None,
            });
            self.table[idx] = Some(fresh);
            self.record_insert();
            return None;
        };

        loop {
            let node = &mut self.pool[tail];
            if node.hash == hash && node.key == key {
                return Some(mem::replace(&mut node.value, value));
            }
            match node.next {
                Some(next) => tail = next,
                None => break,
            }
        }

        let fresh = self.pool.emplace(Node {
            hash,
            key,
            value,
            next: None,
        });
        self.pool[tail].next = Some(fresh);
        self.record_insert();
        None
    }

    fn find<Q>(&self, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = make_hash(&self.hasher, q);
        let mut cur = self.table[bucket_index(hash, self.table.len())];
        while let Some(k) = cur {
            let node = &self.pool[k];
            // Stored hash filters; key equality decides.
            if node.hash == hash && node.key.borrow() == q {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).map(|k| &self.pool[k].value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find(q)?;
        Some(&mut self.pool[k].value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Unlink `q`'s node, return it to the pool and hand back its value.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = make_hash(&self.hasher, q);
        let idx = bucket_index(hash, self.table.len());
        let mut prev: Option<NodeKey> = None;
        let mut cur = self.table[idx];
        while let Some(k) = cur {
            let node = &self.pool[k];
            let next = node.next;
            if node.hash == hash && node.key.borrow() == q {
                match prev {
                    None => self.table[idx] = next,
                    Some(p) => self.pool[p].next = next,
                }
                self.size -= 1;
                return self.pool.deallocate(k).map(|n| n.value);
            }
            prev = cur;
            cur = next;
        }
        None
    }

    /// Delete `q`. Returns whether an entry was removed.
    pub fn del<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(q).is_some()
    }

    /// Check structural invariants: power-of-two capacity, every node in the
    /// bucket its hash selects, and `len()` matching the reachable nodes.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let cap = self.table.len();
        assert!(cap.is_power_of_two() && cap <= MAXIMUM_CAPACITY);
        let mut reachable = 0;
        for (i, slot) in self.table.iter().enumerate() {
            let mut cur = *slot;
            while let Some(k) = cur {
                let node = &self.pool[k];
                assert_eq!(bucket_index(node.hash, cap), i, "node in wrong bucket");
                assert_eq!(node.hash, make_hash(&self.hasher, &node.key));
                reachable += 1;
                assert!(reachable <= self.size, "chain longer than len(): cycle?");
                cur = node.next;
            }
        }
        assert_eq!(reachable, self.size);
        assert_eq!(self.pool.stats().live, self.size);
    }
}

/// Iterator over `(&K, &V)` in bucket order, then chain order.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Option<NodeKey>>,
    pool: &'a NodePool<Node<K, V>>,
    cur: Option<NodeKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let pool = self.pool;
                let node = &pool[k];
                self.cur = node.next;
                self.remaining -= 1;
                return Some((&node.key, &node.value));
            }
            self.cur = *self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in bucket order, then chain order.
pub struct IterMut<'a, K, V> {
    order: std::vec::IntoIter<NodeKey>,
    nodes: SecondaryMap<NodeKey, &'a mut Node<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = &mut self.nodes;
        let node = self.order.by_ref().find_map(|k| nodes.remove(k))?;
        Some((&node.key, &mut node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.order.len();
        (n, Some(n))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Renders `{k1 = v1,k2 = v2}` in iteration order; `{}` when empty.
impl<K, V, S> fmt::Display for ChainedHashMap<K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k} = {v}")?;
        }
        f.write_str("}")
    }
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_hasher(S::default());
        m.extend(iter);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOAD_FACTOR;
    use std::hash::Hasher;
    use test_log::test;

    /// Hashes `u64` keys to themselves so bucket placement is predictable.
    #[derive(Clone, Default)]
    struct IdentityBuildHasher;
    struct IdentityHasher(u64);
    impl BuildHasher for IdentityBuildHasher {
        type Hasher = IdentityHasher;
        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher(0)
        }
    }
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | u64::from(b);
            }
        }
        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }

    fn identity_map(cap: usize) -> ChainedHashMap<u64, u64, IdentityBuildHasher> {
        ChainedHashMap::with_capacity_and_hasher(cap, IdentityBuildHasher)
    }

    fn bucket_keys<S>(m: &ChainedHashMap<u64, u64, S>, i: usize) -> Vec<u64> {
        let mut out = Vec::new();
        let mut cur = m.table[i];
        while let Some(k) = cur {
            out.push(m.pool[k].key);
            cur = m.pool[k].next;
        }
        out
    }

    #[test]
    fn default_map_has_java_defaults() {
        let m: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        assert_eq!(m.capacity(), 16);
        assert_eq!(m.threshold(), 12);
        assert_eq!(m.load_factor(), DEFAULT_LOAD_FACTOR);
        assert!(m.is_empty());
        assert_eq!(m.pool_stats().blocks_allocated, 0);
    }

    #[test]
    fn put_appends_to_chain_tail() {
        let mut m = identity_map(16);
        for k in [3u64, 19, 35] {
            m.put(k, k);
        }
        assert_eq!(bucket_keys(&m, 3), vec![3, 19, 35]);
        m.assert_invariants();
    }

    #[test]
    fn overwrite_in_middle_of_chain_keeps_node() {
        let mut m = identity_map(16);
        for k in [3u64, 19, 35] {
            m.put(k, 0);
        }
        let before = m.pool_stats();
        assert_eq!(m.put(19, 7), Some(0));
        assert_eq!(m.pool_stats(), before, "overwrite must not allocate");
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(&19), Some(&7));
        assert_eq!(bucket_keys(&m, 3), vec![3, 19, 35]);
    }

    #[test]
    fn resize_splits_chain_into_low_and_high_preserving_order() {
        let mut m = identity_map(16);
        // All land in bucket 1 of a 16-slot table; bit 16 decides the split.
        let keys = [1u64, 17, 33, 49, 65, 81, 97, 113, 129, 145, 161, 177];
        for &k in &keys {
            m.put(k, k);
        }
        assert_eq!(m.capacity(), 16);
        assert_eq!(bucket_keys(&m, 1), keys.to_vec());

        let stats_before = m.pool_stats();
        m.put(193, 193); // 13 > 12
        assert_eq!(m.capacity(), 32);
        assert_eq!(m.threshold(), 24);
        assert_eq!(bucket_keys(&m, 1), vec![1, 33, 65, 97, 129, 161, 193]);
        assert_eq!(bucket_keys(&m, 17), vec![17, 49, 81, 113, 145, 177]);

        let stats_after = m.pool_stats();
        assert_eq!(stats_after.live, stats_before.live + 1);
        assert_eq!(stats_after.pending, stats_before.pending);
        m.assert_invariants();
    }

    #[test]
    fn resize_moves_single_nodes_directly() {
        let mut m = identity_map(2);
        assert_eq!(m.threshold(), 1);
        m.put(2, 2);
        m.put(1, 1); // 2 > 1: grow to 4
        assert_eq!(m.capacity(), 4);
        assert_eq!(bucket_keys(&m, 2), vec![2]);
        assert_eq!(bucket_keys(&m, 1), vec![1]);
        m.assert_invariants();
    }

    #[test]
    fn small_tables_recompute_threshold_from_load_factor() {
        assert_eq!(grown_size(1, 0, 0.75), Some((2, 1)));
        assert_eq!(grown_size(2, 1, 0.75), Some((4, 3)));
        assert_eq!(grown_size(8, 6, 0.75), Some((16, 12)));
        // From the default size on, the threshold is shifted.
        assert_eq!(grown_size(16, 12, 0.75), Some((32, 24)));
        assert_eq!(grown_size(16, 13, 0.75), Some((32, 26)));
    }

    #[test]
    fn growth_stops_at_maximum_capacity() {
        assert_eq!(grown_size(MAXIMUM_CAPACITY, 1, 0.75), None);
        let (cap, thr) = grown_size(MAXIMUM_CAPACITY / 2, 1 << 28, 0.75).unwrap();
        assert_eq!(cap, MAXIMUM_CAPACITY);
        assert_eq!(thr, usize::MAX);
    }

    #[test]
    fn zero_shifted_threshold_falls_back_to_recomputation() {
        // A tiny load factor leaves the 16-slot threshold at 0.
        assert_eq!(grown_size(16, 0, 0.01), Some((32, 0)));
        assert_eq!(grown_size(64, 0, 0.05), Some((128, 6)));
    }

    #[test]
    fn capacity_one_grows_on_first_insert() {
        let mut m = identity_map(1);
        assert_eq!(m.threshold(), 0);
        m.put(5, 5);
        assert_eq!(m.capacity(), 2);
        assert_eq!(m.get(&5), Some(&5));
        m.assert_invariants();
    }

    #[test]
    fn remove_unlinks_head_middle_and_tail() {
        let mut m = identity_map(16);
        for k in [4u64, 20, 36, 52] {
            m.put(k, k * 10);
        }
        assert_eq!(m.remove(&20), Some(200));
        assert_eq!(bucket_keys(&m, 4), vec![4, 36, 52]);
        assert_eq!(m.remove(&4), Some(40));
        assert_eq!(bucket_keys(&m, 4), vec![36, 52]);
        assert_eq!(m.remove(&52), Some(520));
        assert_eq!(bucket_keys(&m, 4), vec![36]);
        assert_eq!(m.remove(&68), None);
        assert_eq!(m.len(), 1);
        m.assert_invariants();
    }

    #[test]
    fn delete_never_shrinks_the_table() {
        let mut m = identity_map(16);
        for k in 0..100u64 {
            m.put(k, k);
        }
        let cap = m.capacity();
        for k in 0..100u64 {
            assert!(m.del(&k));
        }
        assert!(m.is_empty());
        assert_eq!(m.capacity(), cap);
    }

    #[test]
    fn clear_returns_nodes_to_pool_and_keeps_capacity() {
        let mut m: ChainedHashMap<u64, u64, IdentityBuildHasher> =
            ChainedHashMap::with_config_and_hasher(
                MapConfig::default().with_block_size(8),
                IdentityBuildHasher,
            )
            .unwrap();
        for k in 0..40u64 {
            m.put(k, k);
        }
        let cap = m.capacity();
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), cap);
        assert_eq!(m.pool_stats().live, 0);
        assert!(m.iter().next().is_none());
        m.put(1, 1);
        assert_eq!(m.get(&1), Some(&1));
        m.assert_invariants();
    }

    #[test]
    fn iter_follows_bucket_then_chain_order() {
        let mut m = identity_map(16);
        for k in [18u64, 2, 1, 17] {
            m.put(k, 0);
        }
        let keys: Vec<u64> = m.keys().copied().collect();
        assert_eq!(keys, vec![1, 17, 18, 2]);
        assert_eq!(m.iter().len(), 4);
    }

    #[test]
    fn iter_mut_updates_every_value() {
        let mut m = identity_map(4);
        for k in 0..50u64 {
            m.put(k, k);
        }
        for (_, v) in m.iter_mut() {
            *v += 1;
        }
        for v in m.values_mut() {
            *v *= 2;
        }
        for k in 0..50u64 {
            assert_eq!(m.get(&k), Some(&((k + 1) * 2)));
        }
    }

    #[test]
    fn iter_mut_follows_bucket_then_chain_order() {
        let mut m: ChainedHashMap<u64, u64> = ChainedHashMap::new();
        for k in 0..100u64 {
            m.put(k, k);
        }
        let expected: Vec<u64> = m.keys().copied().collect();
        let seen: Vec<u64> = m.iter_mut().map(|(k, _)| *k).collect();
        assert_eq!(seen, expected);
        assert_eq!(m.iter_mut().len(), 100);

        let mut chained = identity_map(16);
        for k in [18u64, 2, 1, 17] {
            chained.put(k, k);
        }
        let keys: Vec<u64> = chained.iter_mut().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 17, 18, 2]);
        let values: Vec<u64> = chained.values_mut().map(|v| *v).collect();
        assert_eq!(values, vec![1, 17, 18, 2]);
    }

    #[test]
    fn growth_at_ceiling_pins_threshold_and_keeps_table() {
        let mut m = identity_map(4);
        for k in [1u64, 5, 2] {
            m.put(k, k);
        }
        let before = bucket_keys(&m, 1);
        m.apply_growth(None);
        assert_eq!(m.threshold(), usize::MAX);
        assert_eq!(m.capacity(), 4);
        assert_eq!(bucket_keys(&m, 1), before);

        // With the threshold pinned, further inserts only lengthen chains.
        for k in 10..200u64 {
            m.put(k, k);
        }
        assert_eq!(m.capacity(), 4);
        assert_eq!(m.len(), 193);
        m.assert_invariants();
    }

    #[test]
    fn stored_hash_comes_from_the_map_hasher() {
        let mut m = identity_map(16);
        m.put(0x0005_0000, 1);
        let expected = make_hash(m.hasher(), &0x0005_0000u64);
        assert_eq!(expected, 0x0005_0005);
        assert_eq!(bucket_keys(&m, bucket_index(expected, 16)), vec![0x0005_0000]);
    }

    #[test]
    fn pool_churn_releases_retired_slots() {
        let mut m: ChainedHashMap<u64, u64> =
            ChainedHashMap::with_config(MapConfig::default().with_block_size(4)).unwrap();
        for k in 0..16u64 {
            m.put(k, k);
        }
        for k in 0..8u64 {
            assert!(m.del(&k));
        }
        // 8 retired > 4 * 1.75
        let s = m.pool_stats();
        assert_eq!(s.bulk_releases, 1);
        assert_eq!(s.pending, 0);
        assert_eq!(s.live, 8);
        m.assert_invariants();
    }
}
