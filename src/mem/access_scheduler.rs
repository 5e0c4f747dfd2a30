//! Access scheduler: picks the next request per bank (spec.md §4.4 point 1).

use std::collections::{HashMap, VecDeque};

use crate::config::AccessSchedulerPolicy;
use crate::event::{CacheRequest, CacheRequestKind};
use crate::ids::MemoryBankId;

struct TypedQueues {
    fetch: VecDeque<CacheRequest>,
    load: VecDeque<CacheRequest>,
    store_or_wb: VecDeque<CacheRequest>,
}

impl TypedQueues {
    fn new() -> Self {
        Self {
            fetch: VecDeque::new(),
            load: VecDeque::new(),
            store_or_wb: VecDeque::new(),
        }
    }

    fn push(&mut self, request: CacheRequest) {
        match request.kind {
            CacheRequestKind::Fetch => self.fetch.push_back(request),
            CacheRequestKind::Load => self.load.push_back(request),
            CacheRequestKind::Store | CacheRequestKind::Writeback => self.store_or_wb.push_back(request),
        }
    }

    fn peek(&self, policy: AccessSchedulerPolicy) -> Option<&CacheRequest> {
        match policy {
            AccessSchedulerPolicy::Fifo => self
                .fetch
                .front()
                .or_else(|| self.load.front())
                .or_else(|| self.store_or_wb.front()),
            AccessSchedulerPolicy::FifoRrTypePriority => self
                .fetch
                .front()
                .or_else(|| self.load.front())
                .or_else(|| self.store_or_wb.front()),
        }
    }

    fn pop_matching(&mut self, request: &CacheRequest) -> CacheRequest {
        let queue = match request.kind {
            CacheRequestKind::Fetch => &mut self.fetch,
            CacheRequestKind::Load => &mut self.load,
            CacheRequestKind::Store | CacheRequestKind::Writeback => &mut self.store_or_wb,
        };
        queue.pop_front().expect("peeked request must still be at the front")
    }

    fn is_empty(&self) -> bool {
        self.fetch.is_empty() && self.load.is_empty() && self.store_or_wb.is_empty()
    }
}

/// One per-bank FIFO plus a round-robin pointer across banks
/// (spec.md §4.4: "`fifo` (one queue per bank, round-robin across banks)").
pub struct AccessScheduler {
    policy: AccessSchedulerPolicy,
    per_bank: HashMap<MemoryBankId, TypedQueues>,
    order: Vec<MemoryBankId>,
    rr_cursor: usize,
}

impl AccessScheduler {
    #[must_use]
    pub fn new(policy: AccessSchedulerPolicy, banks: &[MemoryBankId]) -> Self {
        let mut per_bank = HashMap::new();
        for &bank in banks {
            per_bank.insert(bank, TypedQueues::new());
        }
        Self {
            policy,
            per_bank,
            order: banks.to_vec(),
            rr_cursor: 0,
        }
    }

    pub fn push(&mut self, bank: MemoryBankId, request: CacheRequest) {
        self.per_bank.get_mut(&bank).expect("unknown bank").push(request);
    }

    /// Returns `(bank, head request)` for the next bank (round-robin from
    /// the last serviced bank) that has a pending request, without
    /// removing it.
    #[must_use]
    pub fn peek_next_ready(&mut self) -> Option<(MemoryBankId, CacheRequest)> {
        let n = self.order.len();
        for offset in 0..n {
            let index = (self.rr_cursor + offset) % n;
            let bank = self.order[index];
            if let Some(head) = self.per_bank[&bank].peek(self.policy) {
                return Some((bank, head.clone()));
            }
        }
        None
    }

    /// Removes the head request for `bank` and advances the round-robin
    /// cursor past it.
    pub fn pop(&mut self, bank: MemoryBankId) -> CacheRequest {
        let position = self.order.iter().position(|&b| b == bank).expect("unknown bank");
        self.rr_cursor = (position + 1) % self.order.len();
        let head = self.per_bank[&bank].peek(self.policy).cloned().expect("pop on empty bank");
        self.per_bank.get_mut(&bank).unwrap().pop_matching(&head)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.per_bank.values().all(TypedQueues::is_empty)
    }
}
