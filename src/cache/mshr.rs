//! In-flight miss tracking (spec.md §3 `InFlightMissTable`, §8 invariants
//! 4 and 5), grounded on `cache::data::Data::miss_queue`-style coalescing in
//! the teacher's `cache/data.rs`. Keyed by line address; every request that
//! misses onto a line already pending is coalesced onto the same entry and
//! acked in the same cycle as the parent.

use std::collections::HashMap;

use crate::address::Address;
use crate::event::CacheRequest;

pub struct InFlightEntry {
    /// The request that triggered the downstream fetch.
    pub parent: CacheRequest,
    /// Every request (including the parent) waiting on this line, in
    /// arrival order — so their acks fire in a deterministic order within
    /// the acking cycle.
    pub coalesced: Vec<CacheRequest>,
}

/// Bounded by `max_outstanding_misses` (spec.md §8 invariant 4).
pub struct InFlightMissTable {
    max_outstanding: usize,
    entries: HashMap<Address, InFlightEntry>,
}

impl InFlightMissTable {
    #[must_use]
    pub fn new(max_outstanding: usize) -> Self {
        Self {
            max_outstanding,
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_outstanding
    }

    #[must_use]
    pub fn contains(&self, line_address: Address) -> bool {
        self.entries.contains_key(&line_address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Coalesces `request` onto an existing entry for `line_address`.
    /// Panics (via `debug_assert`) if no such entry exists — callers must
    /// check [`Self::contains`] first.
    pub fn coalesce(&mut self, line_address: Address, request: CacheRequest) {
        let entry = self
            .entries
            .get_mut(&line_address)
            .expect("coalesce called with no existing in-flight entry");
        entry.coalesced.push(request);
    }

    /// Opens a brand-new entry for a line that just missed.
    pub fn insert(&mut self, line_address: Address, parent: CacheRequest) {
        debug_assert!(!self.is_full(), "in-flight miss table inserted past capacity");
        self.entries.insert(
            line_address,
            InFlightEntry {
                coalesced: vec![parent.clone()],
                parent,
            },
        );
    }

    /// Removes and returns the entry for `line_address` on ack, for the
    /// caller to deliver acks to every coalesced request
    /// (spec.md §8 invariant 5).
    pub fn take(&mut self, line_address: Address) -> Option<InFlightEntry> {
        self.entries.remove(&line_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CacheRequestKind;
    use crate::ids::TileId;

    fn request(addr: Address) -> CacheRequest {
        CacheRequest::new(0, 0, 0, TileId(0), addr, 8, CacheRequestKind::Load)
    }

    #[test]
    fn second_miss_to_same_line_coalesces_onto_first() {
        let mut table = InFlightMissTable::new(4);
        table.insert(0x1000, request(0x1000));
        assert!(table.contains(0x1000));
        table.coalesce(0x1000, request(0x1000));
        let entry = table.take(0x1000).unwrap();
        assert_eq!(entry.coalesced.len(), 2);
    }

    #[test]
    fn table_reports_full_at_capacity() {
        let mut table = InFlightMissTable::new(1);
        table.insert(0x1000, request(0x1000));
        assert!(table.is_full());
    }
}
