//! The [`ConSet`] and other related structures.

use std::collections::hash_map::RandomState;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;

#[cfg(feature = "rayon")]
use rayon::iter::{FromParallelIterator, IntoParallelIterator, ParallelExtend, ParallelIterator};

use crate::raw::config::Options;
use crate::raw::Raw;

/// A concurrent set accumulator.
///
/// The set flavour of [`ConMap`][crate::ConMap]. Threads [`insert`][ConSet::insert] values
/// concurrently, then the owner [`consume`][ConSet::consume]s them all as a plain [`HashSet`].
/// Inserting a value that is already present does nothing (the original value stays).
///
/// ```rust
/// use conaccum::ConSet;
/// use crossbeam_utils::thread;
///
/// let set = ConSet::new();
///
/// thread::scope(|s| {
///     s.spawn(|_| {
///         set.insert("hello");
///         set.insert("world");
///     });
///     s.spawn(|_| {
///         set.insert("world");
///     });
/// }).unwrap();
///
/// let result = set.consume();
/// assert_eq!(2, result.len());
/// assert!(result.contains("hello"));
/// assert!(result.contains("world"));
/// ```
///
/// ```rust
/// use conaccum::set::ConSet;
/// let set: ConSet<usize> = ConSet::new();
///
/// set.insert(0);
/// set.insert(1);
/// set.insert(1);
///
/// assert_eq!(2, set.len());
///
/// let first = set.consume();
/// assert!(set.is_empty());
///
/// set.insert(2);
/// let second = set.consume();
/// assert!(first.contains(&1));
/// assert!(!second.contains(&1));
/// ```
pub struct ConSet<T, S = RandomState>
where
    T: Hash + Eq,
    S: BuildHasher + Clone,
{
    raw: Raw<HashSet<T, S>>,
}

impl<T> ConSet<T, RandomState>
where
    T: Hash + Eq,
{
    /// Creates a new empty set.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::default())
    }

    /// Creates a new empty set, pre-sized for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::default())
    }
}

impl<T, S> ConSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Clone,
{
    /// Creates a new empty set with the given hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_options(Options::default(), hasher)
    }

    /// Creates a new empty set with the given capacity hint and hasher.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::with_options(Options::default().capacity(capacity), hasher)
    }

    /// Creates a new empty set, fully configured.
    pub fn with_options(options: Options, hasher: S) -> Self {
        Self {
            raw: Raw::with_options(options, hasher),
        }
    }

    /// Inserts a value into the set.
    ///
    /// If an equal value is already present, nothing happens.
    pub fn insert(&self, value: T) {
        self.raw.put(value);
    }

    /// Takes all the accumulated values out, leaving the set empty.
    ///
    /// See [`ConMap::consume`][crate::ConMap::consume], the same guarantees apply.
    pub fn consume(&self) -> HashSet<T, S> {
        self.raw.take()
    }

    /// Returns the number of accumulated values.
    ///
    /// Only a snapshot if other threads are inserting at the time.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Checks if the set is currently empty.
    ///
    /// Note that due to being concurrent, the use-case of this method is mostly for debugging
    /// purposes, because the state can change between reading the value and acting on it.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the accumulated values, dismantling the set.
    pub fn into_inner(self) -> HashSet<T, S> {
        self.raw.into_inner()
    }

    /// Returns the hasher used by the set.
    pub fn hasher(&self) -> &S {
        self.raw.hash_builder()
    }

    /// Returns into how many independently locked shards the set is split.
    pub fn shards(&self) -> usize {
        self.raw.shards()
    }
}

impl<T, S> Default for ConSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Clone + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, S> Debug for ConSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Clone,
{
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        fmt.debug_struct("ConSet")
            .field("shards", &self.shards())
            .field("len", &self.len())
            .finish()
    }
}

impl<'a, T, S> Extend<T> for &'a ConSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Clone,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        for n in iter {
            self.insert(n);
        }
    }
}

impl<T, S> Extend<T> for ConSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Clone,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut me: &ConSet<_, _> = self;
        me.extend(iter);
    }
}

impl<T> FromIterator<T> for ConSet<T>
where
    T: Hash + Eq,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut me = ConSet::new();
        me.extend(iter);
        me
    }
}

#[cfg(feature = "rayon")]
impl<'a, T, S> ParallelExtend<T> for &'a ConSet<T, S>
where
    T: Hash + Eq + Send,
    S: BuildHasher + Clone + Send + Sync,
{
    fn par_extend<I>(&mut self, par_iter: I)
    where
        I: IntoParallelIterator<Item = T>,
    {
        let me: &ConSet<_, _> = *self;
        par_iter.into_par_iter().for_each(|n| {
            me.insert(n);
        });
    }
}

#[cfg(feature = "rayon")]
impl<T, S> ParallelExtend<T> for ConSet<T, S>
where
    T: Hash + Eq + Send,
    S: BuildHasher + Clone + Send + Sync,
{
    fn par_extend<I>(&mut self, par_iter: I)
    where
        I: IntoParallelIterator<Item = T>,
    {
        let mut me: &ConSet<_, _> = self;
        me.par_extend(par_iter);
    }
}

#[cfg(feature = "rayon")]
impl<T> FromParallelIterator<T> for ConSet<T>
where
    T: Hash + Eq + Send,
{
    fn from_par_iter<I>(par_iter: I) -> Self
    where
        I: IntoParallelIterator<Item = T>,
    {
        let mut me = ConSet::new();
        me.par_extend(par_iter);
        me
    }
}
