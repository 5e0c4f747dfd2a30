//! Tile (spec.md §3 `Tile`, §4.3): bundles L2 banks and an arbiter, routes
//! local vs. remote/memory accesses via its [`crate::access_director::AccessDirector`].

use crate::access_director::AccessDirector;
use crate::ids::{ArbiterId, CacheBankId, MemoryTileId, TileId};

use stats::tile::Tile as TileStats;

pub struct Tile {
    pub id: TileId,
    pub arbiter: ArbiterId,
    pub banks: Vec<CacheBankId>,
    pub memory_tile: MemoryTileId,
    pub director: AccessDirector,
    pub stats: TileStats,
}

impl Tile {
    #[must_use]
    pub fn new(id: TileId, arbiter: ArbiterId, banks: Vec<CacheBankId>, memory_tile: MemoryTileId, director: AccessDirector) -> Self {
        Self {
            id,
            arbiter,
            banks,
            memory_tile,
            director,
            stats: TileStats { id: id.index(), ..Default::default() },
        }
    }

    #[must_use]
    pub fn bank_for_index(&self, index: usize) -> CacheBankId {
        self.banks[index % self.banks.len()]
    }
}
