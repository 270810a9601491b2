//! Hash adapter: user hash plus a fixed avalanche mix.
//!
//! Bucket indices only look at the low bits of a hash (`hash & (cap - 1)`),
//! so the high half is folded down with `h ^ (h >> 16)` before indexing.
//! The mixed value is what every node stores and what resize splits on.

use core::hash::{BuildHasher, Hash};

/// Shift used by the avalanche mix.
const MIX_SHIFT: u32 = 16;

/// Spread high bits of `raw` into the low bits used for bucket selection.
#[inline]
pub const fn mix(raw: u64) -> u64 {
    raw ^ (raw >> MIX_SHIFT)
}

/// Hash `q` with `hasher` and apply [`mix`].
#[inline]
pub fn make_hash<S, Q>(hasher: &S, q: &Q) -> u64
where
    S: BuildHasher,
    Q: ?Sized + Hash,
{
    mix(hasher.hash_one(q))
}

/// Bucket index of `hash` in a table of `capacity` slots.
///
/// `capacity` must be a power of two.
#[inline]
pub(crate) fn bucket_index(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity.is_power_of_two());
    // Only the low bits survive the mask, so truncating to usize first is fine.
    (hash as usize) & (capacity - 1)
}
