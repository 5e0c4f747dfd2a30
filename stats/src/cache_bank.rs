use serde::{Deserialize, Serialize};

/// Per-cache-bank counters (spec.md §4.2, §8).
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBank {
    pub id: usize,
    pub hits: u64,
    pub misses: u64,
    pub misses_on_already_pending: u64,
    pub hits_on_store: u64,
    pub writebacks: u64,
    pub writeback_stalls: u64,
    pub stalls: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub scratchpad_commands: u64,
}

impl std::ops::AddAssign for CacheBank {
    fn add_assign(&mut self, other: Self) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.misses_on_already_pending += other.misses_on_already_pending;
        self.hits_on_store += other.hits_on_store;
        self.writebacks += other.writebacks;
        self.writeback_stalls += other.writeback_stalls;
        self.stalls += other.stalls;
        self.bytes_read += other.bytes_read;
        self.bytes_written += other.bytes_written;
        self.scratchpad_commands += other.scratchpad_commands;
    }
}
