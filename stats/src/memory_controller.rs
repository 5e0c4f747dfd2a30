use serde::{Deserialize, Serialize};

/// Per-memory-controller counters (spec.md §4.4).
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryController {
    pub id: usize,
    pub reads: u64,
    pub writes: u64,
    pub writebacks: u64,
    pub commands_issued: u64,
    pub commands_deferred_for_timing: u64,
    pub acks_sent: u64,
}

impl std::ops::AddAssign for MemoryController {
    fn add_assign(&mut self, other: Self) {
        self.reads += other.reads;
        self.writes += other.writes;
        self.writebacks += other.writebacks;
        self.commands_issued += other.commands_issued;
        self.commands_deferred_for_timing += other.commands_deferred_for_timing;
        self.acks_sent += other.acks_sent;
    }
}
