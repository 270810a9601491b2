//! Construction-time tuning for `ChainedHashMap` and its node pool.

use thiserror::Error;

/// Default bucket count. Must be a power of two.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1 << 4;

/// Largest bucket count the table grows to. Must be a power of two.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

/// Load factor used when none is configured.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Node slots reserved per pool block.
pub const DEFAULT_BLOCK_SIZE: usize = 1 << 10;

/// Pending slots are released once they exceed `block_size` times this.
pub const DEFAULT_RELEASE_FACTOR: f32 = 1.75;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("load factor must be finite and greater than zero, got {0}")]
    InvalidLoadFactor(f32),
    #[error("pool block size must be non-zero")]
    ZeroBlockSize,
    #[error("pool release factor must be finite and at least 1, got {0}")]
    InvalidReleaseFactor(f32),
}

/// Map and pool parameters. Build with [`MapConfig::default`] and the
/// `with_*` setters; values are checked when the map is constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    pub initial_capacity: usize,
    pub load_factor: f32,
    pub block_size: usize,
    pub release_factor: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            block_size: DEFAULT_BLOCK_SIZE,
            release_factor: DEFAULT_RELEASE_FACTOR,
        }
    }
}

impl MapConfig {
    pub fn with_initial_capacity(mut self, n: usize) -> Self {
        self.initial_capacity = n;
        self
    }

    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_release_factor(mut self, release_factor: f32) -> Self {
        self.release_factor = release_factor;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.load_factor.is_finite() || self.load_factor <= 0.0 {
            return Err(ConfigError::InvalidLoadFactor(self.load_factor));
        }
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if !self.release_factor.is_finite() || self.release_factor < 1.0 {
            return Err(ConfigError::InvalidReleaseFactor(self.release_factor));
        }
        Ok(())
    }

    /// Bucket count actually used for `initial_capacity`.
    pub fn table_capacity(&self) -> usize {
        table_size_for(self.initial_capacity)
    }
}

/// Smallest power of two `>= n`, clamped to `[1, MAXIMUM_CAPACITY]`.
pub fn table_size_for(n: usize) -> usize {
    if n >= MAXIMUM_CAPACITY {
        return MAXIMUM_CAPACITY;
    }
    n.max(1).next_power_of_two()
}

/// `capacity * load_factor` truncated, or `usize::MAX` once the product
/// reaches the capacity ceiling.
pub(crate) fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    let ft = capacity as f32 * load_factor;
    if capacity < MAXIMUM_CAPACITY && ft < MAXIMUM_CAPACITY as f32 {
        ft as usize
    } else {
        usize::MAX
    }
}
