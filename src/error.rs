use std::collections::TryReserveError;
use thiserror::Error;

/// Failure to grow the slot array.
///
/// This is the only error a table can produce. When it is returned from
/// [`ChainedHashTable::try_add`](crate::ChainedHashTable::try_add) the table is
/// unchanged and the element was not inserted.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("slot array capacity overflowed usize")]
    CapacityOverflow,
    #[error("failed to allocate slot array: {0}")]
    AllocFailed(#[from] TryReserveError),
}
