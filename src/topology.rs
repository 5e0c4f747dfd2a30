//! Minimal topology builder.
//!
//! The real topology-description/factory/wiring layer that instantiates and
//! port-binds a full multi-tile, multi-controller system at startup is
//! deliberately out of scope for the core (it is listed as an external
//! collaborator). What lives here is the small, internal wiring needed to
//! exercise the core components end to end: one cache bank backed by one
//! memory controller, connected through the scheduler rather than a real
//! NoC hop. It is enough to drive the CLI's demo mode and the integration
//! tests; a production deployment supplies its own factory that builds the
//! full mesh out of the same arena/id primitives.
//!
//! Each `Downstream` impl below borrows the live `&World` for the duration
//! of the call that constructed it (never stored past that call), and uses
//! it only to read `now` and push a freshly-boxed `FnOnce(&World)` onto the
//! scheduler; the boxed closures themselves close over nothing but `Copy`
//! ids and the request payload, so they satisfy the scheduler's `'static`
//! bound without needing the borrow to outlive the call.

use crate::address::Cycle;
use crate::cache::bank::Downstream as CacheDownstream;
use crate::cache::CacheBank;
use crate::config::Config;
use crate::event::CacheRequest;
use crate::ids::{CacheBankId, MemoryControllerId};
use crate::mem::controller::ControllerDownstream;
use crate::mem::MemoryController;
use crate::scheduler::Phase;
use crate::world::World;

pub struct SinglePathTopology {
    pub bank: CacheBankId,
    pub controller: MemoryControllerId,
}

#[must_use]
pub fn build_single_path(config: &Config) -> (World, SinglePathTopology) {
    let noc = Box::new(crate::noc::FunctionalNoc::new(crate::ids::NocId(0), Cycle::from(config.noc.packet_latency)));
    let trace: Box<dyn crate::trace::TraceSink> = Box::new(crate::trace::NullTraceSink);
    let mut world = World::new(config.clone(), noc, trace);

    let bank = world.push_cache_bank(CacheBank::new(CacheBankId(0), config.dcache.clone()));
    let controller = world.push_memory_controller(MemoryController::new(
        MemoryControllerId(0),
        config.memory.clone(),
        config.topology.num_memory_banks,
    ));

    (world, SinglePathTopology { bank, controller })
}

fn schedule_at(world: &World, at: Cycle, phase: Phase, callback: impl FnOnce(&World) + 'static) {
    let now = world.scheduler().borrow().now();
    let delta = at.saturating_sub(now);
    world.scheduler().borrow_mut().schedule(delta, phase, callback);
}

/// Bridges a [`CacheBank`] to the single memory controller it is wired to:
/// misses and write-through/writeback traffic go downstream to the
/// controller, acks go straight back to the originating core.
struct BankToController<'w> {
    world: &'w World,
    controller: MemoryControllerId,
}

impl<'w> CacheDownstream for BankToController<'w> {
    fn forward_miss(&mut self, request: CacheRequest, at: Cycle) {
        let controller = self.controller;
        schedule_at(self.world, at, Phase::Tick, move |world| {
            world.memory_controller(controller).borrow_mut().enqueue(request);
            schedule_controller_cycle(world, controller);
        });
    }

    fn forward_writeback(&mut self, request: CacheRequest, at: Cycle) {
        self.forward_miss(request, at);
    }

    fn ack(&mut self, request: CacheRequest, at: Cycle) {
        schedule_at(self.world, at, Phase::PostTick, move |world| {
            world.record_ack(request.origin_core);
        });
    }
}

/// Self-scheduling "running" bit (spec.md §9): reschedules
/// `controller_cycle` every cycle while the controller still has pending
/// work, stopping once it reports idle.
fn schedule_controller_cycle(world: &World, controller: MemoryControllerId) {
    world.scheduler().borrow_mut().schedule(0, Phase::Tick, move |world| {
        run_controller_cycle(world, controller);
    });
}

fn run_controller_cycle(world: &World, controller: MemoryControllerId) {
    let mut downstream = ControllerToBank { world, bank: CacheBankId(0), controller };
    let now = world.scheduler().borrow().now();
    let still_running = world.memory_controller(controller).borrow_mut().controller_cycle(now, &mut downstream);
    if still_running {
        world.scheduler().borrow_mut().schedule(1, Phase::Tick, move |world| {
            run_controller_cycle(world, controller);
        });
    }
}

/// Bridges the memory controller back to the one cache bank it serves:
/// acks re-enter the bank's `put_request` as serviced requests, refill
/// reads go back around through the controller.
struct ControllerToBank<'w> {
    world: &'w World,
    bank: CacheBankId,
    controller: MemoryControllerId,
}

impl<'w> ControllerDownstream for ControllerToBank<'w> {
    fn ack(&mut self, request: CacheRequest, at: Cycle) {
        let bank = self.bank;
        let controller = self.controller;
        schedule_at(self.world, at, Phase::PostTick, move |world| {
            let mut downstream = BankToController { world, controller };
            let now = world.scheduler().borrow().now();
            world.cache_bank(bank).borrow_mut().put_request(request, now, &mut downstream);
        });
    }

    fn refill_read(&mut self, request: CacheRequest, at: Cycle) {
        let controller = self.controller;
        schedule_at(self.world, at, Phase::Tick, move |world| {
            world.memory_controller(controller).borrow_mut().enqueue(request);
            schedule_controller_cycle(world, controller);
        });
    }
}

/// Submits a fresh request from the functional executor into the topology
/// (spec.md §6 "Functional executor API").
pub fn submit_request(world: &World, topology: &SinglePathTopology, request: CacheRequest) {
    let now = world.scheduler().borrow().now();
    let mut downstream = BankToController { world, controller: topology.controller };
    world.cache_bank(topology.bank).borrow_mut().put_request(request, now, &mut downstream);

    let bank = topology.bank;
    world.scheduler().borrow_mut().schedule(1, Phase::Tick, move |world| {
        drive_bank(world, bank);
    });
}

fn drive_bank(world: &World, bank: CacheBankId) {
    let controller = MemoryControllerId(0);
    let mut downstream = BankToController { world, controller };
    let now = world.scheduler().borrow().now();
    world.cache_bank(bank).borrow_mut().issue_access(now, &mut downstream);
    if world.cache_bank(bank).borrow().is_busy() {
        world.scheduler().borrow_mut().schedule(1, Phase::Tick, move |world| {
            drive_bank(world, bank);
        });
    }
}
