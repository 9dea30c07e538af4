//! The [`ConMap`] and other related structures.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;

#[cfg(feature = "rayon")]
use rayon::iter::{FromParallelIterator, IntoParallelIterator, ParallelExtend, ParallelIterator};

use crate::raw::config::Options;
use crate::raw::Raw;

/// A concurrent map accumulator.
///
/// Any number of threads may [`insert_or_assign`][ConMap::insert_or_assign] into it at the same
/// time. Once they are all done (the caller joins them, or otherwise waits on some barrier), the
/// owner calls [`consume`][ConMap::consume] and gets all the entries as a plain [`HashMap`]. The
/// map is left empty and ready for another round.
///
/// There's intentionally no way to look at the entries while they are being accumulated. No
/// method returns a reference into the map, therefore nothing can get invalidated by other
/// threads inserting.
///
/// ```rust
/// use conaccum::ConMap;
/// use crossbeam_utils::thread;
///
/// let map = ConMap::new();
///
/// thread::scope(|s| {
///     s.spawn(|_| {
///         map.insert_or_assign("hello", 1);
///     });
///     s.spawn(|_| {
///         map.insert_or_assign("world", 2);
///     });
/// }).unwrap();
///
/// let result = map.consume();
/// assert_eq!(1, result["hello"]);
/// assert_eq!(2, result["world"]);
/// assert!(map.is_empty());
/// ```
///
/// # Insert racing consume
///
/// It is memory safe to call [`consume`][ConMap::consume] while other threads still insert.
/// However, each such insert ends up either in the returned map or in the next round and it is
/// not specified which one. To get complete and deterministic results, make sure all the writers
/// have finished first.
pub struct ConMap<K, V, S = RandomState>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    raw: Raw<HashMap<K, V, S>>,
}

impl<K, V> ConMap<K, V>
where
    K: Hash + Eq,
{
    /// Creates a new empty map.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::default())
    }

    /// Creates a new empty map, pre-sized for `capacity` entries.
    ///
    /// The capacity is kept across consumptions, so each round starts pre-sized.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::default())
    }
}

impl<K, V, S> ConMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    /// Creates a new empty map with the given hasher.
    ///
    /// The hasher is also the one the consumed [`HashMap`]s use.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_options(Options::default(), hasher)
    }

    /// Creates a new empty map with the given capacity hint and hasher.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::with_options(Options::default().capacity(capacity), hasher)
    }

    /// Creates a new empty map, fully configured.
    pub fn with_options(options: Options, hasher: S) -> Self {
        Self {
            raw: Raw::with_options(options, hasher),
        }
    }

    /// Inserts an entry, overwriting the value if the key is already present.
    ///
    /// Out of several threads inserting the same key concurrently, it is unspecified whose value
    /// stays.
    pub fn insert_or_assign(&self, key: K, value: V) {
        self.raw.put((key, value));
    }

    /// Takes all the accumulated entries out.
    ///
    /// This is the transition from the accumulation to the consumption phase. The returned map is
    /// independent of this one, owned solely by the caller. This map is left empty, as if freshly
    /// created, and can be used for another round right away.
    ///
    /// All the inserts that *happened before* this call are guaranteed to be in the result.
    pub fn consume(&self) -> HashMap<K, V, S> {
        self.raw.take()
    }

    /// Returns the number of accumulated entries.
    ///
    /// Note that while other threads are inserting, this is only a snapshot that may be outdated
    /// by the time it's returned.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Checks if the map is currently empty.
    ///
    /// The same caveat as with [`len`][ConMap::len] applies.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the accumulated entries, dismantling the map.
    ///
    /// As the map is owned, nobody can be inserting any more and there's no need to lock.
    pub fn into_inner(self) -> HashMap<K, V, S> {
        self.raw.into_inner()
    }

    /// Returns the hasher used by the map.
    pub fn hasher(&self) -> &S {
        self.raw.hash_builder()
    }

    /// Returns into how many independently locked shards the map is split.
    pub fn shards(&self) -> usize {
        self.raw.shards()
    }
}

impl<K, V, S> Default for ConMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Debug for ConMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        fmt.debug_struct("ConMap")
            .field("shards", &self.shards())
            .field("len", &self.len())
            .finish()
    }
}

impl<'a, K, V, S> Extend<(K, V)> for &'a ConMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in iter {
            self.insert_or_assign(k, v);
        }
    }
}

impl<K, V, S> Extend<(K, V)> for ConMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let mut me: &ConMap<_, _, _> = self;
        me.extend(iter);
    }
}

impl<K, V> FromIterator<(K, V)> for ConMap<K, V>
where
    K: Hash + Eq,
{
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let mut me = ConMap::new();
        me.extend(iter);
        me
    }
}

#[cfg(feature = "rayon")]
impl<'a, K, V, S> ParallelExtend<(K, V)> for &'a ConMap<K, V, S>
where
    K: Hash + Eq + Send,
    V: Send,
    S: BuildHasher + Clone + Send + Sync,
{
    fn par_extend<T>(&mut self, par_iter: T)
    where
        T: IntoParallelIterator<Item = (K, V)>,
    {
        let me: &ConMap<_, _, _> = *self;
        par_iter.into_par_iter().for_each(|(k, v)| {
            me.insert_or_assign(k, v);
        });
    }
}

#[cfg(feature = "rayon")]
impl<K, V, S> ParallelExtend<(K, V)> for ConMap<K, V, S>
where
    K: Hash + Eq + Send,
    V: Send,
    S: BuildHasher + Clone + Send + Sync,
{
    fn par_extend<T>(&mut self, par_iter: T)
    where
        T: IntoParallelIterator<Item = (K, V)>,
    {
        let mut me: &ConMap<_, _, _> = self;
        me.par_extend(par_iter);
    }
}

#[cfg(feature = "rayon")]
impl<K, V> FromParallelIterator<(K, V)> for ConMap<K, V>
where
    K: Hash + Eq + Send,
    V: Send,
{
    fn from_par_iter<T>(par_iter: T) -> Self
    where
        T: IntoParallelIterator<Item = (K, V)>,
    {
        let mut me = ConMap::new();
        me.par_extend(par_iter);
        me
    }
}
