//! End-to-end scenarios driven through the single-path demo topology: a
//! load misses all the way to DRAM and acks back to its core, and the
//! conservation invariant (every submitted request eventually acks exactly
//! once) holds across a short run.

use coyote::config::Config;
use coyote::event::{CacheRequest, CacheRequestKind};
use coyote::ids::TileId;
use coyote::scheduler::Phase;
use coyote::topology;

fn run_for(world: &coyote::World, cycles: u64) {
    world.scheduler().borrow_mut().schedule(cycles, Phase::Tick, |world| {
        world.scheduler().borrow_mut().mark_finished(0);
    });
    world.run();
}

#[test]
fn scenario_6_single_load_miss_reaches_dram_and_acks_back() {
    let config = Config::default();
    let (world, topo) = topology::build_single_path(&config);

    let request = CacheRequest::new(0, 0, 0, TileId(0), 0x4000, 64, CacheRequestKind::Load);
    topology::submit_request(&world, &topo, request);
    run_for(&world, 500);

    assert_eq!(world.acks_delivered(0), 1);
    let bank_stats = world.cache_bank(topo.bank).borrow().stats.clone();
    assert_eq!(bank_stats.misses, 1);
    let controller_stats = world.memory_controller(topo.controller).borrow().stats.clone();
    assert_eq!(controller_stats.reads, 1);
    assert!(controller_stats.commands_issued >= 1);
}

#[test]
fn scenario_6_second_load_to_same_line_hits_after_fill() {
    let config = Config::default();
    let (world, topo) = topology::build_single_path(&config);

    let first = CacheRequest::new(0, 0, 0, TileId(0), 0x8000, 64, CacheRequestKind::Load);
    topology::submit_request(&world, &topo, first);
    run_for(&world, 500);
    assert_eq!(world.acks_delivered(0), 1);

    let second = CacheRequest::new(0, 0, 0, TileId(0), 0x8000, 64, CacheRequestKind::Load);
    topology::submit_request(&world, &topo, second);
    run_for(&world, 50);

    assert_eq!(world.acks_delivered(0), 2);
    let bank_stats = world.cache_bank(topo.bank).borrow().stats.clone();
    assert_eq!(bank_stats.misses, 1);
    assert_eq!(bank_stats.hits, 1);
}

#[test]
fn conservation_every_submitted_request_acks_exactly_once() {
    let config = Config::default();
    let (world, topo) = topology::build_single_path(&config);

    let addresses = [0x1000, 0x2000, 0x3000, 0x1000, 0x2000];
    for address in addresses {
        let request = CacheRequest::new(0, 0, 0, TileId(0), address, 64, CacheRequestKind::Load);
        topology::submit_request(&world, &topo, request);
    }
    run_for(&world, 2000);

    assert_eq!(world.acks_delivered(0), addresses.len() as u64);
}
