//! Construction-time configuration of the [`Raw`][crate::raw::Raw] engine.

use log::debug;

/// The largest number of shards an accumulator may be split into.
///
/// Whole-container operations hold all the shard guards at once, on the stack, so this needs to
/// stay reasonably small.
pub const MAX_SHARDS: usize = 64;

/// Tuning knobs of an accumulator.
///
/// None of these change the observable behaviour of the accumulators, only their performance.
/// The defaults (no pre-allocation, single shard) are what [`ConMap::new`][crate::ConMap::new]
/// and [`ConSet::new`][crate::ConSet::new] use.
///
/// ```rust
/// use conaccum::{ConMap, Options};
/// use std::collections::hash_map::RandomState;
///
/// let options = Options::default().capacity(10_000).shards(8);
/// let map: ConMap<u64, u64> = ConMap::with_options(options, RandomState::new());
/// assert_eq!(8, map.shards());
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Options {
    /// How many entries the storage should hold without reallocating.
    ///
    /// The hint is applied again every time the accumulator is consumed, so each accumulation
    /// round starts pre-sized.
    pub capacity: usize,

    /// Into how many independently locked parts the storage is split.
    ///
    /// Rounded up to a power of two and clamped into `1..=MAX_SHARDS`.
    pub shards: usize,
}

impl Options {
    /// Sets the capacity hint.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the requested number of shards.
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// The number of shards that'll actually be created.
    pub(crate) fn effective_shards(&self) -> usize {
        let shards = self.shards.clamp(1, MAX_SHARDS).next_power_of_two();
        if shards != self.shards {
            debug!(
                "Adjusted requested shard count {} to {}",
                self.shards, shards
            );
        }
        shards
    }

    /// The capacity hint for each of `shards` shards.
    pub(crate) fn shard_capacity(&self, shards: usize) -> usize {
        (self.capacity + shards - 1) / shards
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            capacity: 0,
            shards: 1,
        }
    }
}
