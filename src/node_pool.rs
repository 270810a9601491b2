//! NodePool: block-reserving slot allocator with batched release.
//!
//! Storage lives in a `SlotMap` arena. The pool reserves `block_size` empty
//! slots at a time and hands them out through a cursor, so the arena is
//! only touched once per block on the allocation side. Deallocated slots are
//! cleared immediately but stay reserved on a pending list; when that list
//! grows past `block_size * release_factor` it is released back to the
//! arena in one pass.
//!
//! Handles are generational: once a slot has been released, its old
//! `NodeKey` never resolves again, even after the arena reuses the slot.

use crate::config::{DEFAULT_BLOCK_SIZE, DEFAULT_RELEASE_FACTOR};
use core::mem;
use core::ops::{Index, IndexMut};
use log::trace;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to one node-sized storage slot in a [`NodePool`].
    pub struct NodeKey;
}

#[derive(Debug)]
enum Slot<T> {
    /// Reserved, holds nothing yet.
    Vacant,
    Occupied(T),
    /// Cleared by `deallocate`, waiting on the pending list.
    Retired,
}

/// Point-in-time slot accounting for a [`NodePool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Slots holding a value.
    pub live: usize,
    /// Slots of the current block not yet handed out.
    pub reserved: usize,
    /// Retired slots awaiting bulk release.
    pub pending: usize,
    pub blocks_allocated: usize,
    pub bulk_releases: usize,
}

#[derive(Debug)]
pub struct NodePool<T> {
    slots: SlotMap<NodeKey, Slot<T>>,
    block: Vec<NodeKey>,
    cursor: usize,
    pending: Vec<NodeKey>,
    live: usize,
    block_size: usize,
    release_limit: usize,
    blocks_allocated: usize,
    bulk_releases: usize,
}

impl<T> Default for NodePool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE, DEFAULT_RELEASE_FACTOR)
    }
}

impl<T> NodePool<T> {
    /// Create an empty pool. No storage is reserved until the first
    /// allocation.
    ///
    /// `block_size` must be non-zero and `release_factor` at least 1;
    /// `MapConfig::validate` checks both for map-owned pools.
    pub fn new(block_size: usize, release_factor: f32) -> Self {
        debug_assert!(block_size > 0);
        Self {
            slots: SlotMap::with_key(),
            block: Vec::with_capacity(block_size),
            cursor: 0,
            pending: Vec::new(),
            live: 0,
            block_size,
            release_limit: (block_size as f32 * release_factor) as usize,
            blocks_allocated: 0,
            bulk_releases: 0,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Hand out one empty slot, reserving a fresh block when the current
    /// one is used up.
    ///
    /// # Panics
    ///
    /// If the arena cannot grow any further. Exhaustion is not recoverable.
    pub fn allocate(&mut self) -> NodeKey {
        if self.cursor == self.block.len() {
            self.allocate_block();
        }
        let key = self.block[self.cursor];
        self.cursor += 1;
        key
    }

    fn allocate_block(&mut self) {
        self.block.clear();
        self.slots.reserve(self.block_size);
        for _ in 0..self.block_size {
            self.block.push(self.slots.insert(Slot::Vacant));
        }
        self.cursor = 0;
        self.blocks_allocated += 1;
        trace!(
            "node pool reserved block #{} ({} slots, {} in arena)",
            self.blocks_allocated,
            self.block_size,
            self.slots.len()
        );
    }

    /// Initialize storage obtained from [`allocate`](Self::allocate).
    ///
    /// # Panics
    ///
    /// If `key` does not refer to allocated, uninitialized storage.
    pub fn write(&mut self, key: NodeKey, value: T) {
        match self.slots.get_mut(key) {
            Some(slot) if matches!(slot, Slot::Vacant) => *slot = Slot::Occupied(value),
            _ => panic!("NodePool::write: {key:?} is not uninitialized storage"),
        }
        self.live += 1;
    }

    /// Allocate a slot and move `value` into it.
    pub fn emplace(&mut self, value: T) -> NodeKey {
        let key = self.allocate();
        self.write(key, value);
        key
    }

    /// Take the value out of `key` and retire the slot.
    ///
    /// Returns `None` without touching the pool when `key` does not hold a
    /// value (already deallocated, released, or never written).
    pub fn deallocate(&mut self, key: NodeKey) -> Option<T> {
        let slot = self.slots.get_mut(key)?;
        let value = match mem::replace(slot, Slot::Retired) {
            Slot::Occupied(v) => v,
            other => {
                *slot = other;
                return None;
            }
        };
        self.live -= 1;
        self.pending.push(key);
        if self.pending.len() > self.release_limit {
            self.release_pending();
        }
        Some(value)
    }

    /// Return every retired slot to the arena.
    pub fn release_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let n = self.pending.len();
        for key in self.pending.drain(..) {
            self.slots.remove(key);
        }
        self.bulk_releases += 1;
        trace!("node pool released {n} retired slots");
    }

    /// Return the unused tail of the current block to the arena.
    pub fn release_unused(&mut self) {
        for &key in &self.block[self.cursor..] {
            self.slots.remove(key);
        }
        self.block.clear();
        self.cursor = 0;
    }

    pub fn get(&self, key: NodeKey) -> Option<&T> {
        match self.slots.get(key) {
            Some(Slot::Occupied(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut T> {
        match self.slots.get_mut(key) {
            Some(Slot::Occupied(v)) => Some(v),
            _ => None,
        }
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.get(key).is_some()
    }

    /// Live values in arena order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeKey, &mut T)> {
        self.slots.iter_mut().filter_map(|(k, s)| match s {
            Slot::Occupied(v) => Some((k, v)),
            _ => None,
        })
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            live: self.live,
            reserved: self.block.len() - self.cursor,
            pending: self.pending.len(),
            blocks_allocated: self.blocks_allocated,
            bulk_releases: self.bulk_releases,
        }
    }
}

impl<T> Index<NodeKey> for NodePool<T> {
    type Output = T;

    fn index(&self, key: NodeKey) -> &T {
        match self.get(key) {
            Some(v) => v,
            None => panic!("invalid NodeKey {key:?}: storage is not live"),
        }
    }
}

impl<T> IndexMut<NodeKey> for NodePool<T> {
    fn index_mut(&mut self, key: NodeKey) -> &mut T {
        match self.get_mut(key) {
            Some(v) => v,
            None => panic!("invalid NodeKey {key:?}: storage is not live"),
        }
    }
}

impl<T> Drop for NodePool<T> {
    fn drop(&mut self) {
        self.release_unused();
        self.release_pending();
    }
}
