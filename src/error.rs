use core::fmt;

/// Errors reported by [`Table`](crate::Table) and the tables built on the same
/// storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The key is not present in the table.
    KeyNotFound,

    /// A probe visited every slot without finding the key or a slot to put it
    /// in.
    ///
    /// The table keeps its load factor below 2/3, so this means the sizing
    /// invariant was broken. The table is left untouched when it is returned.
    TableExhausted {
        /// Slot count of the table at the time of the failed probe.
        capacity: usize,
    },

    /// A table was requested with a capacity of zero.
    InvalidCapacity,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyNotFound => f.write_str("key not found"),
            Self::TableExhausted { capacity } => {
                write!(f, "table unexpectedly full: probed all {capacity} slots")
            }
            Self::InvalidCapacity => f.write_str("requested capacity must be at least 1"),
        }
    }
}

impl core::error::Error for Error {}

/// Table result
pub type Result<T> = core::result::Result<T, Error>;
