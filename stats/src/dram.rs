use serde::{Deserialize, Serialize};

/// Per-DRAM-bank command counters (spec.md §4.4).
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dram {
    pub bank_id: usize,
    pub activates: u64,
    pub precharges: u64,
    pub reads: u64,
    pub writes: u64,
    /// cycles spent with the bank row open with no ready command
    pub idle_open_cycles: u64,
}

impl std::ops::AddAssign for Dram {
    fn add_assign(&mut self, other: Self) {
        self.activates += other.activates;
        self.precharges += other.precharges;
        self.reads += other.reads;
        self.writes += other.writes;
        self.idle_open_cycles += other.idle_open_cycles;
    }
}
