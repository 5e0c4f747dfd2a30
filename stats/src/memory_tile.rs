use serde::{Deserialize, Serialize};

/// Per-memory-tile (MCPU) counters: vector decomposition and scratchpad traffic.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTile {
    pub id: usize,
    pub vvl_sets: u64,
    pub instructions_decomposed: u64,
    pub element_requests_issued: u64,
    pub scratchpad_allocates: u64,
    pub scratchpad_reads: u64,
    pub scratchpad_writes: u64,
    pub bypass_requests: u64,
    pub forwarded_to_other_tile: u64,
    pub admission_refusals: u64,
    pub llc_hits: u64,
    pub llc_misses: u64,
}

impl std::ops::AddAssign for MemoryTile {
    fn add_assign(&mut self, other: Self) {
        self.vvl_sets += other.vvl_sets;
        self.instructions_decomposed += other.instructions_decomposed;
        self.element_requests_issued += other.element_requests_issued;
        self.scratchpad_allocates += other.scratchpad_allocates;
        self.scratchpad_reads += other.scratchpad_reads;
        self.scratchpad_writes += other.scratchpad_writes;
        self.bypass_requests += other.bypass_requests;
        self.forwarded_to_other_tile += other.forwarded_to_other_tile;
        self.admission_refusals += other.admission_refusals;
        self.llc_hits += other.llc_hits;
        self.llc_misses += other.llc_misses;
    }
}
