//! chained-hashmap: a single-threaded, separately chained hash map with
//! Java-style incremental ("low/high split") resizing and a pooled node
//! allocator.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: the classic `java.util.HashMap` algorithm (power-of-two bucket
//!   table, one singly linked chain per bucket, doubling on a load-factor
//!   threshold) with node storage that is recycled in batches instead of
//!   going through the global allocator on every insert/delete.
//! - Layers:
//!   - `hash`: user `BuildHasher` plus the fixed avalanche mix
//!     `h ^ (h >> 16)`, so low-entropy hashes still spread across the low
//!     index bits.
//!   - `NodePool<T>`: slot allocator over a `slotmap` arena. Hands out
//!     generational `NodeKey` handles from pre-reserved blocks, retires
//!     freed slots to a pending list and releases that list in one pass
//!     once it exceeds `block_size * release_factor`.
//!   - `ChainedHashMap<K, V, S>`: owns the bucket vector and the pool;
//!     buckets and `next` links are `Option<NodeKey>`.
//!
//! Constraints
//! - Single-threaded. Mutation takes `&mut self`; there is no locking.
//! - Bucket count is a power of two in `[1, MAXIMUM_CAPACITY]`.
//! - Each node stores its mixed hash; indexing and resizing never re-run
//!   `K: Hash` after insertion. Lookups compare the stored hash first and
//!   always confirm with `K: Eq`.
//! - Put on an existing key overwrites the value in place; it never
//!   creates a second node.
//!
//! Resizing
//! - Triggered from `put` when `len() > threshold()`. Capacity doubles,
//!   which adds exactly one bit to the index mask, so each old chain splits
//!   into at most two chains: nodes with that bit clear stay at `i`, the
//!   rest move to `i + old_capacity`. Relative order is kept and no node is
//!   allocated or freed.
//! - At `MAXIMUM_CAPACITY` the threshold is pinned to `usize::MAX` and the
//!   table stops growing. Deletes never shrink it.
//!
//! Handles instead of pointers
//! - A `NodeKey` is only valid while its slot is live. After a slot is
//!   released its generation is bumped, so a stale key cannot alias a node
//!   stored later in the same slot.
//!
//! Errors
//! - Misses are `None`/`false`. Invalid construction parameters surface as
//!   `ConfigError`. Arena exhaustion panics.

pub mod chained_hash_map;
mod chained_hash_map_proptest;
pub mod config;
pub mod hash;
pub mod node_pool;

// Public surface
pub use chained_hash_map::{ChainedHashMap, Iter, IterMut};
pub use config::{ConfigError, MapConfig, MAXIMUM_CAPACITY};
pub use node_pool::{NodeKey, NodePool, PoolStats};
