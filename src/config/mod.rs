//! Simulation configuration (spec.md §6 "Configuration"), grounded on the
//! teacher's `GPUConfig` in `config/mod.rs`: a flat, serde-deserializable
//! struct with a `validate`/`parse` entry point that turns bad input into a
//! [`ConfigError`] before a single cycle runs, plus small sub-structs for
//! geometry that parse out of compact strings the way the teacher's cache
//! config does (`sets:assoc:line`).

pub mod policies;
pub mod timing;

pub use policies::{
    AccessSchedulerPolicy, AddressMappingPolicy, CommandSchedulerPolicy, DataMappingPolicy,
    L2SharingMode, NocModel, WritePolicy,
};
pub use timing::DramTiming;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// `sets:assoc:line` cache geometry, e.g. `"64:8:64"` (spec.md §6
/// `dcache/icache config`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGeometry {
    pub sets: u32,
    pub associativity: u32,
    pub line_size: u32,
}

impl CacheGeometry {
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = spec.split(':').collect();
        let [sets, assoc, line] = parts.as_slice() else {
            return Err(ConfigError::InvalidCacheGeometry {
                spec: spec.to_string(),
                reason: "expected `sets:assoc:line`".to_string(),
            });
        };
        let parse_u32 = |s: &str, field: &str| -> Result<u32, ConfigError> {
            s.parse::<u32>().map_err(|_| ConfigError::InvalidCacheGeometry {
                spec: spec.to_string(),
                reason: format!("{field} is not a valid integer: {s:?}"),
            })
        };
        let geometry = Self {
            sets: parse_u32(sets, "sets")?,
            associativity: parse_u32(assoc, "assoc")?,
            line_size: parse_u32(line, "line")?,
        };
        if !geometry.sets.is_power_of_two() || !geometry.line_size.is_power_of_two() {
            return Err(ConfigError::InvalidCacheGeometry {
                spec: spec.to_string(),
                reason: "sets and line must be powers of two".to_string(),
            });
        }
        Ok(geometry)
    }

    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        u64::from(self.sets) * u64::from(self.associativity) * u64::from(self.line_size)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBankConfig {
    pub geometry: CacheGeometry,
    pub hit_latency: u64,
    pub miss_latency: u64,
    pub max_outstanding_misses: usize,
    pub max_in_flight_writebacks: usize,
    pub write_policy: WritePolicy,
    /// Number of ways reserved for scratchpad traffic; `0` disables the
    /// reservation (spec.md §4.2).
    pub scratchpad_reserved_ways: u32,
}

impl Default for CacheBankConfig {
    fn default() -> Self {
        Self {
            geometry: CacheGeometry {
                sets: 64,
                associativity: 8,
                line_size: 64,
            },
            hit_latency: 1,
            miss_latency: 10,
            max_outstanding_misses: 16,
            max_in_flight_writebacks: 8,
            write_policy: WritePolicy::WriteBack,
            scratchpad_reserved_ways: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub num_tiles: u16,
    pub num_cores: u16,
    pub num_threads_per_core: u16,
    pub num_l2_banks: u16,
    pub num_memory_cpus: u16,
    pub num_memory_controllers: u16,
    pub num_memory_banks: u64,
    pub x_size: u16,
    pub y_size: u16,
    pub mcpus_indices: Vec<u16>,
    pub l2_sharing_mode: L2SharingMode,
    pub bank_data_mapping_policy: DataMappingPolicy,
    pub tile_data_mapping_policy: DataMappingPolicy,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            num_tiles: 4,
            num_cores: 4,
            num_threads_per_core: 1,
            num_l2_banks: 1,
            num_memory_cpus: 2,
            num_memory_controllers: 2,
            num_memory_banks: 16,
            x_size: 3,
            y_size: 2,
            mcpus_indices: vec![4, 5],
            l2_sharing_mode: L2SharingMode::TilePrivate,
            bank_data_mapping_policy: DataMappingPolicy::SetInterleaving,
            tile_data_mapping_policy: DataMappingPolicy::SetInterleaving,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NocConfig {
    pub model: NocModel,
    pub packet_latency: u16,
    pub latency_per_hop: u16,
}

impl Default for NocConfig {
    fn default() -> Self {
        Self {
            model: NocModel::Simple,
            packet_latency: 2,
            latency_per_hop: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub address_mapping_policy: AddressMappingPolicy,
    pub access_scheduler_policy: AccessSchedulerPolicy,
    pub command_scheduler_policy: CommandSchedulerPolicy,
    pub timing: DramTiming,
    pub rows: u32,
    pub columns: u32,
    pub element_size: u32,
    pub data_latency: u64,
    pub num_llc_banks: u16,
    pub llc_enabled: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            address_mapping_policy: AddressMappingPolicy::OpenPage,
            access_scheduler_policy: AccessSchedulerPolicy::Fifo,
            command_scheduler_policy: CommandSchedulerPolicy::OldestRwOverPrecharge,
            timing: DramTiming::default(),
            rows: 1 << 15,
            columns: 1 << 10,
            element_size: 64,
            data_latency: 5,
            num_llc_banks: 1,
            llc_enabled: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTileConfig {
    pub sp_register_bytes: u32,
    pub line_size: u32,
    pub latency: u64,
    pub llc_enabled: bool,
}

impl Default for MemoryTileConfig {
    fn default() -> Self {
        Self {
            sp_register_bytes: 128,
            line_size: 64,
            latency: 1,
            llc_enabled: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    pub enabled: bool,
    pub path: Option<String>,
    pub lower_bound: Option<u64>,
    pub upper_bound: Option<u64>,
    pub events_of_interest: Vec<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: None,
            lower_bound: None,
            upper_bound: None,
            events_of_interest: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    pub topology: TopologyConfig,
    #[serde(default)]
    pub dcache: CacheBankConfig,
    #[serde(default)]
    pub icache: CacheBankConfig,
    #[serde(default)]
    pub noc: NocConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub memory_tile: MemoryTileConfig,
    #[serde(default)]
    pub trace: TraceConfig,
    /// Opaque, passed through to the (external) functional executor
    /// untouched (spec.md §6: "isa, varch ... opaque to the core").
    pub isa: String,
    pub varch: String,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let topo = &self.topology;
        if topo.num_cores % topo.num_tiles != 0 {
            return Err(ConfigError::CoresNotDivisibleByTiles {
                num_cores: topo.num_cores,
                num_tiles: topo.num_tiles,
            });
        }
        let product = u32::from(topo.x_size) * u32::from(topo.y_size);
        let expected = u32::from(topo.num_tiles) + u32::from(topo.num_memory_cpus);
        if product != expected {
            return Err(ConfigError::MeshGeometryMismatch {
                x_size: topo.x_size,
                y_size: topo.y_size,
                product,
                expected,
            });
        }
        if topo.mcpus_indices.len() != topo.num_memory_cpus as usize {
            return Err(ConfigError::McpusIndicesLengthMismatch {
                actual: topo.mcpus_indices.len(),
                expected: topo.num_memory_cpus,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_geometry_parses_colon_separated_triple() {
        let geometry = CacheGeometry::parse("64:8:64").unwrap();
        assert_eq!(geometry.sets, 64);
        assert_eq!(geometry.associativity, 8);
        assert_eq!(geometry.line_size, 64);
    }

    #[test]
    fn cache_geometry_rejects_non_power_of_two_line_size() {
        assert!(CacheGeometry::parse("64:8:63").is_err());
    }

    #[test]
    fn default_topology_config_validates() {
        let config = Config {
            topology: TopologyConfig::default(),
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn mismatched_mesh_geometry_is_rejected() {
        let mut config = Config {
            topology: TopologyConfig::default(),
            ..Default::default()
        };
        config.topology.x_size = 2;
        config.topology.y_size = 2;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MeshGeometryMismatch { .. }));
    }
}
