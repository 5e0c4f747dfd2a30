use serde::{Deserialize, Serialize};

/// Per-tile counters: local vs remote vs memory routing, arbiter contention.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: usize,
    pub local_requests: u64,
    pub remote_requests: u64,
    pub memory_requests: u64,
    pub arbiter_grants: u64,
    pub arbiter_stalls: u64,
}

impl std::ops::AddAssign for Tile {
    fn add_assign(&mut self, other: Self) {
        self.local_requests += other.local_requests;
        self.remote_requests += other.remote_requests;
        self.memory_requests += other.memory_requests;
        self.arbiter_grants += other.arbiter_grants;
        self.arbiter_stalls += other.arbiter_stalls;
    }
}
