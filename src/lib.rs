//! chained-hash-table: a single-threaded hash set using separate chaining
//! over a growable slot array.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a set with amortized O(1) `add`/`contains` whose slot placement
//!   is observable (`elements_at_index`, `is_element_at_index`) so callers
//!   can test the quality of their hash function.
//! - Layers:
//!   - `ElementHasher<T>`: the injected hash function. Any `Fn(&T) -> u64`
//!     works; `BuildHasherFn` adapts a `BuildHasher` for `T: Hash`.
//!   - `ChainedHashTable<T, H>`: slot array of chain heads plus an arena
//!     (`slotmap::SlotMap`) owning every entry. Chains link entries by arena
//!     key, so no entry is ever shared or aliased.
//!
//! Constraints
//! - Single-threaded: `Send` but `!Sync`; hosts that share a table must
//!   serialize access themselves.
//! - Set semantics: adding an element equal to a stored one is a no-op.
//! - Load factor: after every insertion `len / capacity <= 0.8`; crossing it
//!   doubles the capacity.
//! - Out-of-range slot queries return 0/false rather than failing.
//!
//! Growth and rehashing invariants
//! - Each entry stores the hash computed when it was inserted, and rehashing
//!   relinks by that stored value. The hash function is never invoked during
//!   a resize, and neither is `Eq`.
//! - The grown slot array is allocated before any chain is touched. Relinking
//!   does not allocate, so a resize either completes or (on allocation
//!   failure, via `try_add`) never starts.
//!
//! Reentrancy policy
//! - Every public entry-point that may run user code (hash function, `Eq`,
//!   `Clone`) holds a debug-only reentrancy guard. Calling back into the same
//!   table from that code panics in debug builds.
//!
//! Copy and move
//! - `Clone` deep-copies the slot array and the arena, and clones the hash
//!   function. Arena keys are preserved by cloning, so chains need no remap.
//! - `take()` moves the contents out and leaves an empty table at the default
//!   capacity with the same hash function.
//!
//! Notes and non-goals
//! - No removal, no iteration, no ordering guarantees.
//! - Allocation failure of the arena is left to the global allocator.

pub mod chained_hash_table;
mod chained_hash_table_proptest;
pub mod error;
pub mod hash_function;
mod reentrancy;
#[cfg(feature = "stats")]
pub mod stats;

// Public surface
pub use chained_hash_table::{ChainedHashTable, DEFAULT_CAPACITY};
pub use error::CapacityError;
pub use hash_function::{BuildHasherFn, ElementHasher};
#[cfg(feature = "stats")]
pub use stats::ChainStats;
