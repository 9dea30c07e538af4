#![doc(
    html_root_url = "https://docs.rs/conaccum/0.1.0/conaccum/",
    test(attr(deny(warnings)))
)]
#![warn(missing_docs)]

//! Concurrent accumulators for fork-join parallelism.
//!
//! A common pattern in parallel programs is to let a bunch of worker threads each produce part
//! of some collection, wait for all of them to finish, and then process the whole collection on a
//! single thread. This crate provides the collections for the first part: a map
//! ([`ConMap`][crate::ConMap]) and a set ([`ConSet`][crate::ConSet]) any number of threads can
//! insert into concurrently, with a single *consume* operation that hands all the accumulated
//! data over as a plain [`HashMap`][std::collections::HashMap] or
//! [`HashSet`][std::collections::HashSet].
//!
//! # The phases
//!
//! During the *accumulation* phase, the threads only insert (and possibly look at the number of
//! accumulated entries). There's deliberately no way to look up, iterate or borrow the entries
//! at that time. Nothing a thread holds can be invalidated by another thread's insert, because no
//! thread holds anything.
//!
//! Once all the inserting threads are done, the owner calls `consume`. That atomically moves all
//! the data out (no copying), leaving the accumulator empty and ready for another round. The
//! returned collection is a completely independent value owned by the caller, who can then do
//! whatever they like with it without any synchronization.
//!
//! ```rust
//! use conaccum::ConMap;
//! use crossbeam_utils::thread;
//!
//! const THREADS: usize = 4;
//! const PER_THREAD: usize = 1000;
//!
//! let map = ConMap::new();
//!
//! thread::scope(|s| {
//!     for t in 0..THREADS {
//!         let map = &map;
//!         s.spawn(move |_| {
//!             for i in 0..PER_THREAD {
//!                 map.insert_or_assign(t * PER_THREAD + i, t);
//!             }
//!         });
//!     }
//! })
//! .unwrap();
//!
//! // All the workers were joined, so everything they inserted is in there.
//! let result = map.consume();
//! assert_eq!(THREADS * PER_THREAD, result.len());
//! assert!(result.iter().all(|(k, t)| k / PER_THREAD == *t));
//! assert!(map.is_empty());
//! ```
//!
//! # The barrier
//!
//! The accumulators don't track who is still inserting. It is up to the caller to make sure all
//! the inserts *happened before* the call to `consume` (joining the threads, waiting on a barrier,
//! the end of a [`rayon`](https://docs.rs/rayon) parallel iterator...). Calling `consume` while
//! other threads still insert is safe, but each of the racing inserts ends up either in the
//! returned collection or in the next round and it's not specified which.
//!
//! # Implementation
//!
//! Under the hood, each accumulator is just a [`parking_lot`](https://docs.rs/parking_lot) mutex
//! protecting an ordinary hash table. No lock-free magic. If many threads insert at once and the
//! lock becomes a bottleneck, the storage can be split into several independently locked shards
//! (see [`Options`][crate::Options]), which doesn't change anything about the behaviour.
//!
//! The shared engine is exposed in the [`raw`][crate::raw] module, for building other flavours.
//!
//! # Features
//!
//! The `rayon` feature adds `ParallelExtend` and `FromParallelIterator` implementations.

pub mod map;
pub mod raw;
pub mod set;
mod tests;

pub use self::map::ConMap;
pub use self::raw::config::{Options, MAX_SHARDS};
pub use self::set::ConSet;
