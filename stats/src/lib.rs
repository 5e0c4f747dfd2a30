pub mod cache_bank;
pub mod dram;
pub mod memory_controller;
pub mod memory_tile;
pub mod noc;
pub mod sim;
pub mod tile;

pub use cache_bank::CacheBank;
pub use dram::Dram;
pub use memory_controller::MemoryController;
pub use memory_tile::MemoryTile;
pub use noc::Noc;
pub use sim::Sim;
pub use tile::Tile;

/// Aggregate stats for one simulation run, reduced across all components.
#[derive(Clone, Default, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PerKernel {
    pub sim: Sim,
    pub cache_banks: Vec<CacheBank>,
    pub memory_controllers: Vec<MemoryController>,
    pub dram: Vec<Dram>,
    pub tiles: Vec<Tile>,
    pub noc: Noc,
    pub memory_tiles: Vec<MemoryTile>,
}
