use serde::{Deserialize, Serialize};

/// Top level counters for a single simulation run.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sim {
    pub cycles: u64,
    pub instructions_retired: u64,
    pub finished_cores: u64,
    pub elapsed_millis: u128,
}

impl std::ops::AddAssign for Sim {
    fn add_assign(&mut self, other: Self) {
        self.cycles += other.cycles;
        self.instructions_retired += other.instructions_retired;
        self.finished_cores += other.finished_cores;
        self.elapsed_millis += other.elapsed_millis;
    }
}
