use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{self, Context};

use coyote::config::Config;
use coyote::event::{CacheRequest, CacheRequestKind};
use coyote::ids::TileId;
use coyote::topology;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Options {
    /// JSON configuration file; falls back to built-in defaults when absent.
    #[arg(short = 'c', long = "config", value_name = "CONFIG_JSON")]
    config: Option<PathBuf>,

    /// Stats output file (JSON); printed to stderr when absent.
    #[arg(short = 'o', long = "stats", value_name = "STATS_OUT")]
    stats_out_file: Option<PathBuf>,

    /// Turn debugging information on.
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
}

fn load_config(options: &Options) -> eyre::Result<Config> {
    let config = match &options.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => Config::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    coyote::init_logging();

    let start = Instant::now();
    let options = Options::parse();
    if options.debug > 0 {
        std::env::set_var("RUST_BACKTRACE", "full");
    }

    let config = load_config(&options)?;
    let (world, topo) = topology::build_single_path(&config);

    // Demo traffic: one scalar load from core 0, routed through the single
    // cache bank and memory controller this topology wires up. A full
    // functional-executor integration drives `submit_request` from decoded
    // instructions instead; see spec.md §6 for that boundary.
    let request = CacheRequest::new(0, 0, 0, TileId(0), 0x1000, 64, CacheRequestKind::Load);
    topology::submit_request(&world, &topo, request);
    world.scheduler().borrow_mut().schedule(1000, coyote::scheduler::Phase::Tick, |world| {
        world.scheduler().borrow_mut().mark_finished(0);
    });

    world.run();

    let controller = world.memory_controller(topo.controller).borrow();
    let report = stats::PerKernel {
        sim: stats::Sim {
            cycles: world.scheduler().borrow().now(),
            instructions_retired: 0,
            finished_cores: world.scheduler().borrow().finished_core_count() as u64,
            elapsed_millis: start.elapsed().as_millis(),
        },
        cache_banks: vec![world.cache_bank(topo.bank).borrow().stats.clone()],
        memory_controllers: vec![controller.stats.clone()],
        dram: controller.dram_stats().cloned().collect(),
        tiles: Vec::new(),
        noc: stats::Noc::default(),
        memory_tiles: Vec::new(),
    };
    drop(controller);

    match options.stats_out_file {
        Some(path) => std::fs::write(&path, serde_json::to_string_pretty(&report)?).with_context(|| format!("writing {}", path.display()))?,
        None => eprintln!("STATS:\n{}", serde_json::to_string_pretty(&report)?),
    }

    eprintln!("completed in {:?}", start.elapsed());
    Ok(())
}
