//! Coyote: a cycle-level architectural simulator for a tiled manycore
//! RISC-V system with near-memory compute.
//!
//! The core owns the discrete-event scheduler, the arena of simulated
//! components ([`world::World`]), and the per-component models (cache
//! banks, memory controllers, the NoC, tiles, memory tiles). Everything
//! upstream of a `CacheRequest`/`McpuInstruction` landing at a tile — ISA
//! decode, register files, the functional execution semantics themselves —
//! is an external collaborator this crate only talks to through the event
//! types in [`event`].

pub mod access_director;
pub mod address;
pub mod arbiter;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod fifo;
pub mod ids;
pub mod mem;
pub mod mem_tile;
pub mod noc;
pub mod scheduler;
pub mod tile;
pub mod topology;
pub mod trace;
pub mod world;

pub use config::Config;
pub use error::{ConfigError, InvariantViolation};
pub use world::World;

/// Initializes `env_logger` the way the teacher's binary does, honoring
/// `RUST_LOG` and defaulting to `info` when it's unset.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
