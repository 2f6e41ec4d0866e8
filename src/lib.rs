#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Error type shared by every table in the crate.
pub mod error;

pub mod hash_table;

/// A hash set stored in a prime-sized, linearly probed table.
///
/// This module provides the `HashSet` returned by `Table::keys`, built on the
/// same `HashTable` storage.
pub mod hash_set;

pub mod primes;

mod slot;

/// The key-value table.
///
/// This module provides `Table`, which wraps the raw `HashTable` with a
/// configurable hasher builder and a key-value interface.
pub mod table;

pub use error::Error;
pub use error::Result;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
pub use slot::SlotState;
pub use table::Table;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "foldhash", feature = "std"))] {
        /// Hasher builder used when none is given: per-instance random seeds.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "foldhash")] {
        /// Hasher builder used when none is given: a fixed seed, since
        /// `no_std` builds have no entropy source.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    } else if #[cfg(feature = "std")] {
        /// Hasher builder used when none is given.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        compile_error!("enable at least one of the `std` or `foldhash` features");
    }
}
