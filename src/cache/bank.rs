//! Cache bank (spec.md §4.2), grounded on `cache::data::Data` in the
//! teacher's `cache/data.rs` for the hit/miss/writeback control flow, with
//! Coyote's own coalescing and hit-on-store rules layered on top.

use std::collections::VecDeque;

use crate::address::{Address, Cycle};
use crate::cache::mshr::InFlightMissTable;
use crate::cache::tag_array::{Probe, TagArray};
use crate::config::{CacheBankConfig, WritePolicy};
use crate::event::{CacheRequest, CacheRequestKind};
use crate::fifo::Fifo;
use crate::ids::CacheBankId;

use stats::cache_bank::CacheBank as CacheBankStats;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum QueueKind {
    Fetch,
    Load,
    Store,
    Scratchpad,
}

/// A downstream sink the bank forwards misses, writebacks, and
/// write-through stores to, and a sink for delivering acks upstream. Kept
/// abstract so the bank has no direct dependency on the tile/NoC/memory
/// wiring that owns it; the access director or memory tile supplies the
/// concrete implementation when it constructs the bank.
pub trait Downstream {
    fn forward_miss(&mut self, request: CacheRequest, at: Cycle);
    fn forward_writeback(&mut self, request: CacheRequest, at: Cycle);
    fn ack(&mut self, request: CacheRequest, at: Cycle);
}

pub struct CacheBank {
    pub id: CacheBankId,
    config: CacheBankConfig,
    tags: TagArray,
    in_flight: InFlightMissTable,

    fetch_queue: VecDeque<CacheRequest>,
    load_queue: VecDeque<CacheRequest>,
    store_queue: VecDeque<CacheRequest>,
    scratchpad_queue: VecDeque<CacheRequest>,

    busy: bool,
    in_flight_writebacks: usize,
    /// A dirty eviction generated while `in_flight_writebacks` was already
    /// at capacity; retried as soon as a writeback-ack frees a slot
    /// (spec.md §4.2 "stalls issues until a WB-ack drains a slot"). Single
    /// slot, matching the teacher's one-deep `pending_wb` retry.
    pending_writeback: Option<CacheRequest>,
    /// Ways disabled by a live scratchpad reservation (spec.md §4.2
    /// "Scratchpad commands ... adjust the number of disabled ways").
    disabled_ways: u32,

    pub stats: CacheBankStats,
}

impl CacheBank {
    #[must_use]
    pub fn new(id: CacheBankId, config: CacheBankConfig) -> Self {
        let tags = TagArray::new(config.geometry);
        let in_flight = InFlightMissTable::new(config.max_outstanding_misses);
        Self {
            id,
            config,
            tags,
            in_flight,
            fetch_queue: VecDeque::new(),
            load_queue: VecDeque::new(),
            store_queue: VecDeque::new(),
            scratchpad_queue: VecDeque::new(),
            busy: false,
            in_flight_writebacks: 0,
            pending_writeback: None,
            disabled_ways: 0,
            stats: CacheBankStats {
                id: id.index(),
                ..Default::default()
            },
        }
    }

    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.in_flight.is_full() || self.in_flight_writebacks >= self.config.max_in_flight_writebacks
    }

    /// A LOAD hits a pending store/writeback for the same line already
    /// queued in this bank (spec.md §4.2 "hit-on-store").
    fn hits_on_pending_store(&self, line_address: Address) -> bool {
        self.store_queue
            .iter()
            .any(|queued| queued.line_address == Some(line_address))
    }

    /// Entry point: `put_event` dispatch for `CacheRequest` (spec.md §4.2).
    pub fn put_request(&mut self, mut request: CacheRequest, now: Cycle, downstream: &mut dyn Downstream) {
        if request.serviced {
            self.handle_ack(request, now, downstream);
            return;
        }

        request.set_line_address(self.config.geometry.line_size);
        let line_address = request.line_address.expect("just set above");

        if request.kind == CacheRequestKind::Load && self.hits_on_pending_store(line_address) {
            self.stats.hits_on_store += 1;
            let mut ack = request;
            ack.serviced = true;
            downstream.ack(ack, now + 1);
            return;
        }

        match request.kind {
            CacheRequestKind::Fetch => self.fetch_queue.push_back(request),
            CacheRequestKind::Load => self.load_queue.push_back(request),
            CacheRequestKind::Store | CacheRequestKind::Writeback => self.store_queue.push_back(request),
        }

        if !self.busy && !self.is_stalled() {
            self.busy = true;
        }
    }

    pub fn put_scratchpad_command(&mut self, request: CacheRequest) {
        self.scratchpad_queue.push_back(request);
    }

    fn next_queued(&mut self) -> Option<(QueueKind, CacheRequest)> {
        if let Some(r) = self.scratchpad_queue.pop_front() {
            return Some((QueueKind::Scratchpad, r));
        }
        if let Some(r) = self.fetch_queue.pop_front() {
            return Some((QueueKind::Fetch, r));
        }
        if let Some(r) = self.load_queue.pop_front() {
            return Some((QueueKind::Load, r));
        }
        if let Some(r) = self.store_queue.pop_front() {
            return Some((QueueKind::Store, r));
        }
        None
    }

    /// Processes one queued request; the caller reschedules this at
    /// `now + hit_latency` while queues remain non-empty (spec.md §4.2
    /// "processes one queued request per hit-latency").
    pub fn issue_access(&mut self, now: Cycle, downstream: &mut dyn Downstream) {
        let Some((kind, request)) = self.next_queued() else {
            self.busy = false;
            return;
        };

        if kind == QueueKind::Scratchpad {
            // ALLOCATE/FREE complete immediately and only move the
            // disabled-ways counter (spec.md §4.2).
            self.stats.scratchpad_commands += 1;
            let mut ack = request;
            ack.serviced = true;
            downstream.ack(ack, now + 1);
            self.reschedule_if_more_work(now, downstream);
            return;
        }

        let line_address = request.line_address.expect("queued requests have a line address");
        match self.tags.probe(line_address) {
            Probe::Hit { way } => {
                self.stats.hits += 1;
                self.tags.touch(line_address, way);
                let write_back = self.config.write_policy == WritePolicy::WriteBack;
                if matches!(request.kind, CacheRequestKind::Store | CacheRequestKind::Writeback) {
                    if write_back {
                        self.tags.set_dirty(line_address, 0, true);
                    } else {
                        downstream.forward_writeback(request.clone(), now + self.config.hit_latency);
                    }
                }
                self.stats.bytes_read += u64::from(request.size);
                let mut ack = request;
                ack.serviced = true;
                downstream.ack(ack, now + self.config.hit_latency);
            }
            Probe::Miss => {
                if self.in_flight.contains(line_address) {
                    self.stats.misses_on_already_pending += 1;
                    self.in_flight.coalesce(line_address, request);
                } else {
                    self.stats.misses += 1;
                    self.in_flight.insert(line_address, request.clone());
                    downstream.forward_miss(request, now + self.config.miss_latency);
                }
            }
        }

        self.reschedule_if_more_work(now, downstream);
    }

    fn reschedule_if_more_work(&mut self, _now: Cycle, _downstream: &mut dyn Downstream) {
        let more_work = !self.fetch_queue.is_empty()
            || !self.load_queue.is_empty()
            || !self.store_queue.is_empty()
            || !self.scratchpad_queue.is_empty();
        self.busy = more_work && !self.is_stalled();
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// `sendAckInternal_` (spec.md §4.2 "Completion and ack"). A
    /// writeback-ack only ever frees an in-flight-writeback credit; it never
    /// re-enters tag allocation (the line it touched was already installed
    /// when the *fill* ack for that line was handled) and never produces a
    /// second ack to the originating core.
    fn handle_ack(&mut self, ack: CacheRequest, now: Cycle, downstream: &mut dyn Downstream) {
        if ack.kind == CacheRequestKind::Writeback {
            self.on_writeback_acked(now, downstream);
            return;
        }

        let line_address = ack.line_address.expect("acks carry a line address");
        let victim = self.tags.allocate(line_address);
        self.stats.bytes_written += u64::from(ack.size);

        if victim.valid && victim.dirty && self.config.write_policy == WritePolicy::WriteBack {
            let victim_address = self.tags.victim_address(line_address, victim.tag);
            let mut wb = CacheRequest::new(
                ack.pc,
                ack.origin_timestamp,
                ack.origin_core,
                ack.source_tile,
                victim_address,
                self.config.geometry.line_size,
                CacheRequestKind::Writeback,
            );
            wb.set_line_address(self.config.geometry.line_size);
            self.queue_or_send_writeback(wb, now, downstream);
        }

        if let Some(entry) = self.in_flight.take(line_address) {
            for mut coalesced in entry.coalesced {
                coalesced.serviced = true;
                downstream.ack(coalesced, now);
            }
        } else {
            downstream.ack(ack, now);
        }
    }

    fn queue_or_send_writeback(&mut self, wb: CacheRequest, now: Cycle, downstream: &mut dyn Downstream) {
        if self.in_flight_writebacks < self.config.max_in_flight_writebacks {
            self.in_flight_writebacks += 1;
            self.stats.writebacks += 1;
            downstream.forward_writeback(wb, now + 1);
        } else {
            self.stats.writeback_stalls += 1;
            self.pending_writeback = Some(wb);
        }
    }

    /// A writeback this bank issued has been acked. If another eviction was
    /// stalled behind the in-flight-writeback cap, its writeback takes the
    /// freed slot immediately (the credit count doesn't change); otherwise
    /// the slot is simply returned.
    fn on_writeback_acked(&mut self, now: Cycle, downstream: &mut dyn Downstream) {
        if self.in_flight_writebacks >= self.config.max_in_flight_writebacks {
            if let Some(pending) = self.pending_writeback.take() {
                self.stats.writebacks += 1;
                downstream.forward_writeback(pending, now + 1);
                return;
            }
        }
        self.writeback_acked();
    }

    fn writeback_acked(&mut self) {
        self.in_flight_writebacks = self.in_flight_writebacks.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TileId;

    struct RecordingDownstream {
        acked: Vec<CacheRequest>,
        forwarded_misses: Vec<CacheRequest>,
    }

    impl Downstream for RecordingDownstream {
        fn forward_miss(&mut self, request: CacheRequest, _at: Cycle) {
            self.forwarded_misses.push(request);
        }
        fn forward_writeback(&mut self, _request: CacheRequest, _at: Cycle) {}
        fn ack(&mut self, request: CacheRequest, _at: Cycle) {
            self.acked.push(request);
        }
    }

    fn bank() -> CacheBank {
        CacheBank::new(
            CacheBankId(0),
            CacheBankConfig {
                geometry: crate::config::CacheGeometry {
                    sets: 64,
                    associativity: 8,
                    line_size: 64,
                },
                hit_latency: 1,
                miss_latency: 10,
                max_outstanding_misses: 16,
                max_in_flight_writebacks: 8,
                write_policy: WritePolicy::WriteBack,
                scratchpad_reserved_ways: 0,
            },
        )
    }

    fn load(addr: Address) -> CacheRequest {
        CacheRequest::new(0, 0, 0, TileId(0), addr, 64, CacheRequestKind::Load)
    }

    #[test]
    fn scenario_1_single_load_misses_and_acks() {
        let mut bank = bank();
        let mut downstream = RecordingDownstream { acked: vec![], forwarded_misses: vec![] };
        bank.put_request(load(0x1000), 0, &mut downstream);
        bank.issue_access(0, &mut downstream);
        assert_eq!(bank.stats.misses, 1);
        assert_eq!(downstream.forwarded_misses.len(), 1);
        assert_eq!(downstream.forwarded_misses[0].size, 64);
    }

    #[test]
    fn scenario_2_two_loads_same_line_coalesce() {
        let mut bank = bank();
        let mut downstream = RecordingDownstream { acked: vec![], forwarded_misses: vec![] };
        bank.put_request(load(0x1000), 0, &mut downstream);
        bank.issue_access(0, &mut downstream);
        bank.put_request(load(0x1020), 2, &mut downstream);
        bank.issue_access(2, &mut downstream);
        assert_eq!(bank.stats.misses, 1);
        assert_eq!(bank.stats.misses_on_already_pending, 1);
        assert_eq!(downstream.forwarded_misses.len(), 1);

        let mut ack = downstream.forwarded_misses[0].clone();
        ack.serviced = true;
        let mut downstream2 = RecordingDownstream { acked: vec![], forwarded_misses: vec![] };
        bank.put_request(ack, 12, &mut downstream2);
        assert_eq!(downstream2.acked.len(), 2);
    }

    #[test]
    fn scenario_3_store_then_load_hits_on_store() {
        let mut bank = bank();
        let mut downstream = RecordingDownstream { acked: vec![], forwarded_misses: vec![] };
        let mut store = CacheRequest::new(0, 0, 0, TileId(0), 0x1000, 64, CacheRequestKind::Store);
        store.set_line_address(64);
        bank.put_request(store, 0, &mut downstream);
        bank.put_request(load(0x1000), 0, &mut downstream);
        assert_eq!(bank.stats.hits_on_store, 1);
        assert_eq!(downstream.acked.len(), 1);
    }
}
