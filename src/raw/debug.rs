//! A module containing few debug utilities.
//!
//! In general, they are meant for debugging the *accumulator itself*, but it is exposed as
//! potentially useful (eg. to check how well the keys spread across the shards).

use std::fmt::{Display, Formatter, Result as FmtResult};

use super::storage::Storage;
use super::Raw;

impl<St: Storage> Raw<St> {
    // Hack: &mut to make sure it is not shared between threads and nobody is modifying the thing
    // right now.
    /// Panics if any entry lives in a different shard than its key hashes into.
    ///
    /// A misplaced entry could end up duplicated by a later insert into the right shard.
    #[cfg(test)]
    pub(crate) fn assert_placed(&mut self) {
        for (idx, shard) in self.shards.iter().enumerate() {
            // Uncontended, we are &mut.
            let storage = shard.lock();
            let mut misplaced = 0;
            storage.for_each_key(|key| {
                if self.shard_idx(key) != idx {
                    misplaced += 1;
                }
            });
            assert_eq!(0, misplaced, "Shard {} contains misplaced entries", idx);
        }
    }

    fn print_shape(&self, fmt: &mut Formatter) -> FmtResult {
        // Only the sizes are printed, the guards are held just for the duration of this call.
        let guards = self.lock_all();
        write!(fmt, "(")?;
        for (idx, shard) in guards.iter().enumerate() {
            write!(fmt, " {:X}:{}", idx, shard.len())?;
        }
        write!(fmt, " )")
    }
}

/// A pretty-printing wrapper around the raw accumulator.
///
/// The number of entries in each shard is printed if this is used to wrap the raw accumulator.
/// As it locks all the shards for a moment, it blocks inserting threads the same way
/// [`len`][Raw::len] does.
pub struct PrintShape<'a, St: Storage>(pub &'a Raw<St>);

impl<St: Storage> Display for PrintShape<'_, St> {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        self.0.print_shape(fmt)
    }
}
