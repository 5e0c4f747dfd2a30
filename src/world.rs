//! The component arena (spec.md §9 "Cyclic references ... represent
//! components as arena-allocated nodes indexed by numeric ids"). `World`
//! owns every component by value, keyed by the newtype ids in
//! [`crate::ids`]; cross-component references are ids resolved through the
//! arena at call time rather than `Rc` cycles. Every field a running
//! callback might touch is a `RefCell` (see `scheduler.rs`) so callbacks
//! can hold a shared `&World` and still mutate their target.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::arbiter::Arbiter;
use crate::cache::CacheBank;
use crate::config::Config;
use crate::ids::{ArbiterId, CacheBankId, MemoryControllerId, MemoryTileId, NocId, TileId};
use crate::mem::MemoryController;
use crate::mem_tile::MemoryTile;
use crate::noc::Noc;
use crate::scheduler::Scheduler;
use crate::tile::Tile;
use crate::trace::TraceSink;

pub struct World {
    pub config: Config,
    scheduler: RefCell<Scheduler>,

    cache_banks: Vec<RefCell<CacheBank>>,
    arbiters: Vec<RefCell<Arbiter>>,
    tiles: Vec<RefCell<Tile>>,
    memory_controllers: Vec<RefCell<MemoryController>>,
    memory_tiles: Vec<RefCell<MemoryTile>>,
    noc: RefCell<Box<dyn Noc>>,

    trace: RefCell<Box<dyn TraceSink>>,

    conservation: RefCell<HashMap<u16, u64>>,
}

impl World {
    #[must_use]
    pub fn new_empty(num_cores: u16) -> Self {
        Self {
            config: Config::default(),
            scheduler: RefCell::new(Scheduler::new(num_cores)),
            cache_banks: Vec::new(),
            arbiters: Vec::new(),
            tiles: Vec::new(),
            memory_controllers: Vec::new(),
            memory_tiles: Vec::new(),
            noc: RefCell::new(Box::new(crate::noc::FunctionalNoc::new(NocId(0), 1))),
            trace: RefCell::new(Box::new(crate::trace::NullTraceSink)),
            conservation: RefCell::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn new(config: Config, noc: Box<dyn Noc>, trace: Box<dyn TraceSink>) -> Self {
        let num_cores = config.topology.num_cores;
        Self {
            config,
            scheduler: RefCell::new(Scheduler::new(num_cores)),
            cache_banks: Vec::new(),
            arbiters: Vec::new(),
            tiles: Vec::new(),
            memory_controllers: Vec::new(),
            memory_tiles: Vec::new(),
            noc: RefCell::new(noc),
            trace: RefCell::new(trace),
            conservation: RefCell::new(HashMap::new()),
        }
    }

    pub fn scheduler(&self) -> &RefCell<Scheduler> {
        &self.scheduler
    }

    pub fn trace(&self) -> &RefCell<Box<dyn TraceSink>> {
        &self.trace
    }

    pub fn noc(&self) -> &RefCell<Box<dyn Noc>> {
        &self.noc
    }

    pub fn push_cache_bank(&mut self, bank: CacheBank) -> CacheBankId {
        let id = CacheBankId(self.cache_banks.len());
        self.cache_banks.push(RefCell::new(bank));
        id
    }

    pub fn push_arbiter(&mut self, arbiter: Arbiter) -> ArbiterId {
        let id = ArbiterId(self.arbiters.len());
        self.arbiters.push(RefCell::new(arbiter));
        id
    }

    pub fn push_tile(&mut self, tile: Tile) -> TileId {
        let id = TileId(self.tiles.len());
        self.tiles.push(RefCell::new(tile));
        id
    }

    pub fn push_memory_controller(&mut self, controller: MemoryController) -> MemoryControllerId {
        let id = MemoryControllerId(self.memory_controllers.len());
        self.memory_controllers.push(RefCell::new(controller));
        id
    }

    pub fn push_memory_tile(&mut self, tile: MemoryTile) -> MemoryTileId {
        let id = MemoryTileId(self.memory_tiles.len());
        self.memory_tiles.push(RefCell::new(tile));
        id
    }

    pub fn cache_bank(&self, id: CacheBankId) -> &RefCell<CacheBank> {
        &self.cache_banks[id.index()]
    }

    pub fn arbiter(&self, id: ArbiterId) -> &RefCell<Arbiter> {
        &self.arbiters[id.index()]
    }

    pub fn tile(&self, id: TileId) -> &RefCell<Tile> {
        &self.tiles[id.index()]
    }

    pub fn memory_controller(&self, id: MemoryControllerId) -> &RefCell<MemoryController> {
        &self.memory_controllers[id.index()]
    }

    pub fn memory_tile(&self, id: MemoryTileId) -> &RefCell<MemoryTile> {
        &self.memory_tiles[id.index()]
    }

    pub fn num_cache_banks(&self) -> usize {
        self.cache_banks.len()
    }

    /// Records that `core` received its ack for one outstanding request
    /// (spec.md §8 invariant 1, "Conservation").
    pub fn record_ack(&self, core: u16) {
        *self.conservation.borrow_mut().entry(core).or_insert(0) += 1;
    }

    #[must_use]
    pub fn acks_delivered(&self, core: u16) -> u64 {
        self.conservation.borrow().get(&core).copied().unwrap_or(0)
    }
}
