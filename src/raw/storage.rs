//! The [`Storage`] trait, describing what lives behind the guards.

use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasher, Hash};

/// The unsynchronized container living behind each guard of a [`Raw`][crate::raw::Raw].
///
/// This specifies what is stored and how an entry is put in. It is implemented for the standard
/// [`HashMap`] and [`HashSet`], which are also what the accumulators hand out on consumption.
pub trait Storage: Sized {
    /// The part of an entry used for hashing and identification.
    type Key: Hash + Eq;

    /// A single inserted item.
    type Entry;

    /// The hasher the container is built with.
    ///
    /// It has to be `Clone`, because every shard and every reset container gets its own copy.
    type Hasher: BuildHasher + Clone;

    /// Creates an empty container.
    fn with_capacity_and_hasher(capacity: usize, hasher: Self::Hasher) -> Self;

    /// Extracts the key of an entry.
    fn key_of(entry: &Self::Entry) -> &Self::Key;

    /// Puts an entry in, following the container's semantics for an already present key.
    fn put(&mut self, entry: Self::Entry);

    /// Number of entries held.
    fn len(&self) -> usize;

    /// Checks if there's nothing inside.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves all entries of another container with a disjoint set of keys into this one.
    fn absorb(&mut self, other: Self);

    /// Calls the closure on the key of each entry.
    fn for_each_key<F: FnMut(&Self::Key)>(&self, f: F);
}

/// The map flavour. Putting an entry with an existing key overwrites the value.
impl<K, V, S> Storage for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    type Key = K;
    type Entry = (K, V);
    type Hasher = S;

    fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        HashMap::with_capacity_and_hasher(capacity, hasher)
    }

    fn key_of(entry: &(K, V)) -> &K {
        &entry.0
    }

    fn put(&mut self, (key, value): (K, V)) {
        self.insert(key, value);
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn absorb(&mut self, other: Self) {
        self.reserve(other.len());
        self.extend(other);
    }

    fn for_each_key<F: FnMut(&Self::Key)>(&self, f: F) {
        self.keys().for_each(f);
    }
}

/// The set flavour. Putting an already present value leaves the original in place.
impl<T, S> Storage for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Clone,
{
    type Key = T;
    type Entry = T;
    type Hasher = S;

    fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        HashSet::with_capacity_and_hasher(capacity, hasher)
    }

    fn key_of(entry: &T) -> &T {
        entry
    }

    fn put(&mut self, value: T) {
        self.insert(value);
    }

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn absorb(&mut self, other: Self) {
        self.reserve(other.len());
        self.extend(other);
    }

    fn for_each_key<F: FnMut(&Self::Key)>(&self, f: F) {
        self.iter().for_each(f);
    }
}
