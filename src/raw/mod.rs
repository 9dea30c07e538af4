//! The core implementation of the accumulators.
//!
//! This module contains the [`Raw`][crate::raw::Raw] type, which is the engine of both the
//! [`ConMap`][crate::ConMap] and the [`ConSet`][crate::ConSet]. This is exposed to allow wrapping
//! it into further APIs, but is probably not the best thing for general use.

use std::hash::{BuildHasher, Hash, Hasher};
use std::mem;

use arrayvec::ArrayVec;
use crossbeam_utils::CachePadded;
use log::trace;
use parking_lot::{Mutex, MutexGuard};

pub mod config;
pub mod debug;
pub mod storage;

use self::config::{Options, MAX_SHARDS};
use self::storage::Storage;

/// The hash table uses the top bits of the hash for its own purposes (control bytes). Sharding by
/// them would make all keys in one shard look alike to it, so we skip these.
const RESERVED_HASH_BITS: u32 = 7;

/// A single guarded part of the storage.
///
/// Padded, so neighbouring shards' locks don't fight over the same cache line.
type Shard<St> = CachePadded<Mutex<St>>;

/// All the guards of a whole-container operation.
type Guards<'a, St> = ArrayVec<MutexGuard<'a, St>, MAX_SHARDS>;

/// The raw accumulator.
///
/// This is an unsynchronized [`Storage`] (or several of them, called shards) behind exclusion
/// guards, with the single interesting operation being [`take`][Raw::take]. It detaches all the
/// accumulated entries and leaves a fresh empty storage behind, in one critical section.
///
/// Nothing in here ever hands out a reference into the guarded storage. Everything that crosses
/// the boundary is either a count or a completely detached container owned by the caller. That's
/// what makes it impossible to hold an iterator while other threads insert.
///
/// # Lock discipline
///
/// Putting an entry in locks only the shard the key hashes into. Operations looking at the whole
/// container ([`len`][Raw::len], [`is_empty`][Raw::is_empty], [`take`][Raw::take]) lock all the
/// shards, always in ascending order, and hold them together. As nobody ever holds one shard while
/// waiting for a lower one, this can't deadlock.
pub struct Raw<St: Storage> {
    hash_builder: St::Hasher,
    shard_capacity: usize,
    /// Right shift applied to the (pre-shifted) hash to get the shard index.
    ///
    /// Unused with a single shard.
    shift: u32,
    shards: Box<[Shard<St>]>,
}

impl<St: Storage> Raw<St> {
    /// Constructs an empty instance.
    pub fn with_options(options: Options, hash_builder: St::Hasher) -> Self {
        let shard_cnt = options.effective_shards();
        let shard_capacity = options.shard_capacity(shard_cnt);
        // Note: on any sane system, these assertions should actually never ever trigger no matter
        // what the user of the crate does. This is *internal* sanity check. If you ever find a
        // case where it *does* fail, open a bug report.
        assert!(
            shard_cnt.is_power_of_two() && shard_cnt <= MAX_SHARDS,
            "BUG: Invalid shard count {}",
            shard_cnt,
        );
        let shift = u64::BITS - shard_cnt.trailing_zeros();
        let shards = (0..shard_cnt)
            .map(|_| {
                let storage = St::with_capacity_and_hasher(shard_capacity, hash_builder.clone());
                CachePadded::new(Mutex::new(storage))
            })
            .collect();
        Self {
            hash_builder,
            shard_capacity,
            shift,
            shards,
        }
    }

    /// The hasher shared by all the shards (each has its own copy).
    pub fn hash_builder(&self) -> &St::Hasher {
        &self.hash_builder
    }

    /// Number of shards the storage is split into.
    pub fn shards(&self) -> usize {
        self.shards.len()
    }

    fn fresh(&self) -> St {
        St::with_capacity_and_hasher(self.shard_capacity, self.hash_builder.clone())
    }

    /// Picks the shard a key lives in.
    fn shard_idx(&self, key: &St::Key) -> usize {
        if self.shards.len() == 1 {
            return 0;
        }
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);
        ((hasher.finish() << RESERVED_HASH_BITS) >> self.shift) as usize
    }

    fn lock_all(&self) -> Guards<'_, St> {
        self.shards.iter().map(|shard| shard.lock()).collect()
    }

    /// Puts an entry into the storage.
    ///
    /// What happens if an entry with the same key is already present is up to the
    /// [`Storage`].
    pub fn put(&self, entry: St::Entry) {
        let idx = self.shard_idx(St::key_of(&entry));
        self.shards[idx].lock().put(entry);
    }

    /// Number of entries currently held.
    ///
    /// Unless all the inserting threads are known to be done, this is a mere snapshot.
    pub fn len(&self) -> usize {
        self.lock_all().iter().map(|shard| shard.len()).sum()
    }

    /// Checks for emptiness.
    ///
    /// The same snapshot caveat as with [`len`][Raw::len] applies.
    pub fn is_empty(&self) -> bool {
        self.lock_all().iter().all(|shard| shard.is_empty())
    }

    /// Detaches everything accumulated so far, leaving an empty storage behind.
    ///
    /// All the shards are swapped for fresh ones while all of their guards are held, therefore
    /// any single insert ends up either in the returned container or in the next round, never in
    /// both and never lost. Merging the detached shards happens only after the guards are
    /// released, so the inserting threads of the next round don't wait for it.
    pub fn take(&self) -> St {
        let mut guards = self.lock_all();
        let parts = guards
            .iter_mut()
            .map(|guard| mem::replace(&mut **guard, self.fresh()))
            .collect();
        drop(guards);
        let result = Self::merge(parts);
        trace!(
            "Consumed {} entries from {} shards",
            result.len(),
            self.shards.len()
        );
        result
    }

    /// Unwraps the storage without locking.
    ///
    /// Owning the accumulator means no other thread can be inserting, so no guards are needed.
    pub fn into_inner(self) -> St {
        let parts = self
            .shards
            .into_vec()
            .into_iter()
            .map(|shard| CachePadded::into_inner(shard).into_inner())
            .collect();
        Self::merge(parts)
    }

    /// Moves the content of all shards into the largest one.
    ///
    /// The shards hold disjoint sets of keys, so this never overwrites anything.
    fn merge(mut parts: ArrayVec<St, MAX_SHARDS>) -> St {
        let expected: usize = parts.iter().map(St::len).sum();
        let largest = parts
            .iter()
            .enumerate()
            .max_by_key(|(_, part)| part.len())
            .map(|(idx, _)| idx)
            .unwrap_or_default();
        let mut result = parts.swap_remove(largest);
        for part in parts {
            result.absorb(part);
        }
        debug_assert_eq!(
            expected,
            result.len(),
            "Shards contained overlapping keys, is the Hash implementation deterministic?"
        );
        result
    }
}

impl<St> Default for Raw<St>
where
    St: Storage,
    St::Hasher: Default,
{
    fn default() -> Self {
        Self::with_options(Options::default(), Default::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::hash_map::RandomState;
    use std::collections::{HashMap, HashSet};

    use crossbeam_utils::thread;

    use super::*;

    const TEST_THREADS: usize = 4;
    const TEST_BATCH: usize = 10000;
    const TEST_REP: usize = 20;

    // A hasher to create collisions on purpose. Everything ends up in the same shard and the same
    // bucket. We allow tests in higher-level modules to reuse it for their tests.
    #[derive(Clone, Copy, Debug, Default)]
    pub(crate) struct NoHasher;

    impl Hasher for NoHasher {
        fn finish(&self) -> u64 {
            0
        }

        fn write(&mut self, _: &[u8]) {}
    }

    impl BuildHasher for NoHasher {
        type Hasher = NoHasher;

        fn build_hasher(&self) -> NoHasher {
            NoHasher
        }
    }

    #[derive(Clone, Copy, Debug, Default)]
    pub(crate) struct SplatHasher(u64);

    impl Hasher for SplatHasher {
        fn finish(&self) -> u64 {
            self.0
        }
        fn write(&mut self, value: &[u8]) {
            for val in value {
                for idx in 0..mem::size_of::<u64>() {
                    self.0 ^= (*val as u64) << (8 * idx);
                }
            }
        }
    }

    #[derive(Clone, Copy, Debug, Default)]
    pub(crate) struct MakeSplatHasher;

    impl BuildHasher for MakeSplatHasher {
        type Hasher = SplatHasher;

        fn build_hasher(&self) -> SplatHasher {
            SplatHasher::default()
        }
    }

    /// Tests the test hasher.
    #[test]
    fn splat_hasher() {
        let mut hasher = MakeSplatHasher.build_hasher();
        hasher.write_u8(0);
        assert_eq!(0, hasher.finish());
        hasher.write_u8(8);
        assert_eq!(0x0808080808080808, hasher.finish());
    }

    #[test]
    fn consts_consistent() {
        assert!(MAX_SHARDS.is_power_of_two());
        assert!(MAX_SHARDS.trailing_zeros() + RESERVED_HASH_BITS <= u64::BITS);
    }

    fn sharded<St: Storage>(shards: usize, hasher: St::Hasher) -> Raw<St> {
        Raw::with_options(Options::default().shards(shards), hasher)
    }

    #[test]
    fn shard_idx_in_range() {
        for shards in [1, 2, 8, MAX_SHARDS] {
            let raw: Raw<HashSet<usize>> = sharded(shards, RandomState::new());
            for i in 0..TEST_BATCH {
                assert!(raw.shard_idx(&i) < shards);
            }
        }
    }

    /// With enough keys, all the shards get used. Otherwise the sharding would be pointless.
    #[test]
    fn shards_used() {
        let mut raw: Raw<HashSet<usize>> = sharded(8, RandomState::new());
        for i in 0..TEST_BATCH {
            raw.put(i);
        }
        for shard in raw.shards.iter_mut() {
            assert!(!shard.get_mut().is_empty());
        }
        raw.assert_placed();
    }

    #[test]
    fn take_empty() {
        let raw: Raw<HashMap<usize, usize>> = Raw::default();
        assert!(raw.is_empty());
        assert!(raw.take().is_empty());
        assert!(raw.is_empty());
    }

    #[test]
    fn take_resets() {
        for shards in [1, 4, MAX_SHARDS] {
            let raw: Raw<HashMap<usize, usize>> = sharded(shards, RandomState::new());
            for i in 0..TEST_BATCH {
                raw.put((i, i));
            }
            assert_eq!(TEST_BATCH, raw.len());
            let taken = raw.take();
            assert_eq!(TEST_BATCH, taken.len());
            assert!(raw.is_empty());
            assert_eq!(0, raw.len());
            for i in 0..TEST_BATCH {
                assert_eq!(i, taken[&i]);
            }
        }
    }

    #[test]
    fn take_keeps_capacity_hint() {
        let options = Options::default().capacity(1000).shards(4);
        let mut raw: Raw<HashSet<usize>> = Raw::with_options(options, RandomState::new());
        raw.put(1);
        let _ = raw.take();
        for shard in raw.shards.iter_mut() {
            assert!(shard.get_mut().capacity() >= 250);
        }
    }

    #[test]
    fn all_in_one_shard() {
        let mut raw: Raw<HashSet<usize, NoHasher>> = sharded(8, NoHasher);
        for i in 0..100 {
            raw.put(i);
        }
        raw.assert_placed();
        assert_eq!(100, raw.shards[0].get_mut().len());
        assert_eq!(100, raw.take().len());
    }

    #[test]
    fn into_inner_merges() {
        let raw: Raw<HashSet<usize>> = sharded(16, RandomState::new());
        for i in 0..TEST_BATCH {
            raw.put(i);
        }
        let set = raw.into_inner();
        assert_eq!(TEST_BATCH, set.len());
        assert!((0..TEST_BATCH).all(|i| set.contains(&i)));
    }

    #[test]
    fn par_put_take() {
        for _ in 0..TEST_REP {
            let mut raw: Raw<HashSet<usize>> = sharded(TEST_THREADS, RandomState::new());
            thread::scope(|s| {
                for t in 0..TEST_THREADS {
                    let raw = &raw;
                    s.spawn(move |_| {
                        for i in 0..TEST_BATCH {
                            raw.put(t * TEST_BATCH + i);
                        }
                    });
                }
            })
            .unwrap();

            raw.assert_placed();
            let set = raw.take();
            assert_eq!(TEST_THREADS * TEST_BATCH, set.len());
            assert!(raw.is_empty());
        }
    }

    /// Takes while other threads still insert. Nothing is guaranteed about which round each entry
    /// lands in, but each must land in exactly one.
    #[test]
    fn take_racing_puts() {
        for shards in [1, 8] {
            let raw: Raw<HashSet<usize>> = sharded(shards, RandomState::new());
            let mut rounds = Vec::new();
            thread::scope(|s| {
                for t in 0..TEST_THREADS {
                    let raw = &raw;
                    s.spawn(move |_| {
                        for i in 0..TEST_BATCH {
                            raw.put(t * TEST_BATCH + i);
                        }
                    });
                }
                for _ in 0..TEST_REP {
                    rounds.push(raw.take());
                }
            })
            .unwrap();
            rounds.push(raw.take());

            let total: usize = rounds.iter().map(HashSet::len).sum();
            assert_eq!(TEST_THREADS * TEST_BATCH, total);
            let all: HashSet<_> = rounds.into_iter().flatten().collect();
            assert_eq!(TEST_THREADS * TEST_BATCH, all.len());
        }
    }
}
