//! Access director (spec.md §4.7): converts a raw `CacheRequest` into a
//! routing decision — home tile, cache-bank index, and local-vs-remote
//! dispatch.

use crate::address::Address;
use crate::config::{DataMappingPolicy, L2SharingMode};
use crate::event::{CacheRequest, NoCMessage, NoCMessageKind};
use crate::ids::TileId;

/// {tag, set, bank, tile}-bit widths derived from cache/topology geometry
/// (spec.md §4.7).
#[derive(Copy, Clone, Debug)]
pub struct AddressDecodingWidths {
    pub block_offset_bits: u32,
    pub set_bits: u32,
    pub bank_bits: u32,
    pub tile_bits: u32,
}

pub struct AccessDirector {
    pub tile: TileId,
    pub sharing_mode: L2SharingMode,
    pub tile_mapping: DataMappingPolicy,
    pub bank_mapping: DataMappingPolicy,
    pub widths: AddressDecodingWidths,
    pub num_tiles: u16,
    pub num_banks: u16,
}

pub struct RoutingDecision {
    pub line_address: Address,
    pub home_tile: TileId,
    pub cache_bank: usize,
    pub is_local: bool,
}

impl AccessDirector {
    fn home_tile(&self, line_address: Address) -> TileId {
        match self.sharing_mode {
            L2SharingMode::TilePrivate => self.tile,
            L2SharingMode::FullyShared => {
                let shift = self.widths.block_offset_bits + self.widths.set_bits + self.widths.bank_bits;
                let bits = crate::address::log2(u64::from(self.num_tiles).next_power_of_two());
                let index = match self.tile_mapping {
                    DataMappingPolicy::SetInterleaving => {
                        crate::address::extract_bits(line_address, self.widths.block_offset_bits, bits)
                    }
                    DataMappingPolicy::PageToBank => crate::address::extract_bits(line_address, shift, bits),
                };
                TileId((index as usize) % usize::from(self.num_tiles))
            }
        }
    }

    fn cache_bank_index(&self, line_address: Address) -> usize {
        let bits = crate::address::log2(u64::from(self.num_banks).next_power_of_two());
        let index = match self.bank_mapping {
            DataMappingPolicy::SetInterleaving => {
                crate::address::extract_bits(line_address, self.widths.block_offset_bits, bits)
            }
            DataMappingPolicy::PageToBank => {
                crate::address::extract_bits(line_address, self.widths.block_offset_bits + self.widths.set_bits, bits)
            }
        };
        (index as usize) % usize::from(self.num_banks)
    }

    /// `put_access` entry point (spec.md §4.7): computes the routing
    /// decision for a fresh request, stamping `home_tile`/`cache_bank`
    /// exactly once (spec.md §3 invariant).
    pub fn put_access(&self, request: &mut CacheRequest, line_size: u32) -> RoutingDecision {
        request.set_line_address(line_size);
        let line_address = request.line_address.expect("just set above");
        let home_tile = self.home_tile(line_address);
        let cache_bank = self.cache_bank_index(line_address);
        request.home_tile = Some(home_tile);
        request.cache_bank = Some(cache_bank);
        RoutingDecision {
            line_address,
            home_tile,
            cache_bank,
            is_local: home_tile == self.tile,
        }
    }

    #[must_use]
    pub fn remote_l2_request_message(&self, request: CacheRequest, src_port: u16, dst_port: u16) -> NoCMessage {
        NoCMessage::new(NoCMessageKind::RemoteL2Request, 512, src_port, dst_port, crate::event::Event::CacheRequest(request))
    }

    #[must_use]
    pub fn memory_request_message(&self, request: CacheRequest, src_port: u16, dst_port: u16) -> NoCMessage {
        use crate::event::CacheRequestKind;
        let kind = match request.kind {
            CacheRequestKind::Load | CacheRequestKind::Fetch => NoCMessageKind::MemoryRequestLoad,
            CacheRequestKind::Store => NoCMessageKind::MemoryRequestStore,
            CacheRequestKind::Writeback => NoCMessageKind::MemoryRequestWb,
        };
        NoCMessage::new(kind, 512, src_port, dst_port, crate::event::Event::CacheRequest(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CacheRequestKind;

    fn director(sharing: L2SharingMode) -> AccessDirector {
        AccessDirector {
            tile: TileId(0),
            sharing_mode: sharing,
            tile_mapping: DataMappingPolicy::SetInterleaving,
            bank_mapping: DataMappingPolicy::SetInterleaving,
            widths: AddressDecodingWidths { block_offset_bits: 6, set_bits: 6, bank_bits: 1, tile_bits: 2 },
            num_tiles: 4,
            num_banks: 2,
        }
    }

    #[test]
    fn tile_private_always_routes_home() {
        let director = director(L2SharingMode::TilePrivate);
        let mut req = CacheRequest::new(0, 0, 0, TileId(0), 0x1000, 64, CacheRequestKind::Load);
        let decision = director.put_access(&mut req, 64);
        assert_eq!(decision.home_tile, TileId(0));
        assert!(decision.is_local);
    }
}
