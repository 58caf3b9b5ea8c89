//! Chain distribution statistics, enabled with the `stats` feature.

use crate::chained_hash_table::ChainedHashTable;

/// Snapshot of how elements are spread over the slot array.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainStats {
    /// Number of elements in the table
    pub len: usize,
    /// Number of slots in the slot array
    pub capacity: usize,
    /// Slots heading a non-empty chain
    pub occupied_slots: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// `len / capacity`
    pub load_factor: f64,
}

impl ChainStats {
    /// Mean chain length over occupied slots; 0.0 for an empty table.
    pub fn mean_occupied_chain(&self) -> f64 {
        if self.occupied_slots == 0 {
            0.0
        } else {
            self.len as f64 / self.occupied_slots as f64
        }
    }
}

impl<T, H> ChainedHashTable<T, H> {
    /// Walks every chain once and summarizes their lengths.
    pub fn chain_stats(&self) -> ChainStats {
        let (occupied_slots, longest_chain) = self
            .chain_lengths()
            .filter(|&n| n > 0)
            .fold((0, 0), |(occupied, longest), n| (occupied + 1, longest.max(n)));
        ChainStats {
            len: self.len(),
            capacity: self.capacity(),
            occupied_slots,
            longest_chain,
            load_factor: self.len() as f64 / self.capacity() as f64,
        }
    }
}
