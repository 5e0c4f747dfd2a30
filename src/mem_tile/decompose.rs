//! Vector memory-instruction decomposition into per-element/per-line cache
//! requests (spec.md §4.5 "Vector LOAD address generation", "Vector
//! STORE").

use crate::address::Address;
use crate::event::{McpuInstruction, VectorSuboperation};

/// One generated cache-line-sized sub-access and the fraction of the
/// parent vector instruction it carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ElementRequest {
    pub address: Address,
    pub size: u32,
}

/// Index-form granularity: the spec fixes 32-byte sub-accesses for
/// NON_UNIT/ORDERED_INDEX/UNORDERED_INDEX regardless of element width
/// (spec.md §4.5: "emit `vvl` LOADs of 32-byte granularity").
const INDEXED_GRANULARITY: u32 = 32;

/// Decomposes `instruction` into cache-line requests per spec.md §4.5.
/// `indices` must already be resolved (the caller issues the index
/// SP-READ first for `ORDERED_INDEX`/`UNORDERED_INDEX` and only calls this
/// once that reply has landed).
#[must_use]
pub fn decompose(instruction: &McpuInstruction, vvl: u32, line_size: u32) -> Vec<ElementRequest> {
    match instruction.suboperation {
        VectorSuboperation::Unit => {
            let total_bytes = u64::from(vvl) * u64::from(instruction.element_width);
            let num_lines = total_bytes.div_ceil(u64::from(line_size));
            (0..num_lines)
                .map(|i| ElementRequest {
                    address: instruction.base_address + i * u64::from(line_size),
                    size: line_size,
                })
                .collect()
        }
        VectorSuboperation::NonUnit | VectorSuboperation::OrderedIndex | VectorSuboperation::UnorderedIndex => {
            (0..vvl as usize)
                .map(|i| {
                    let index = instruction.indices.get(i).copied().unwrap_or(i as u64 * u64::from(instruction.element_width));
                    ElementRequest {
                        address: instruction.base_address + index,
                        size: INDEXED_GRANULARITY,
                    }
                })
                .collect()
        }
    }
}

/// Number of elements folded into each outgoing SP-WRITE reply
/// (spec.md §4.5: "elements-per-response = `line_size / width`" for
/// NON_UNIT forms; UNIT folds the whole decomposed line into one reply).
#[must_use]
pub fn elements_per_response(instruction: &McpuInstruction, line_size: u32) -> u32 {
    match instruction.suboperation {
        VectorSuboperation::Unit => line_size / instruction.element_width.max(1),
        VectorSuboperation::NonUnit | VectorSuboperation::OrderedIndex | VectorSuboperation::UnorderedIndex => {
            line_size / instruction.element_width.max(1)
        }
    }
}

/// Outgoing SP-WRITE count for the NON_UNIT/indexed forms
/// (spec.md §4.5: "outgoing SP-WRITEs = `ceil(vvl / elements_per_response)`").
#[must_use]
pub fn num_sp_writes(vvl: u32, elements_per_response: u32) -> u32 {
    vvl.div_ceil(elements_per_response.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::VectorOperation;
    use crate::ids::{InstructionId, TileId};

    fn instruction(sub: VectorSuboperation, base: Address, indices: Vec<u64>) -> McpuInstruction {
        McpuInstruction {
            pc: 0,
            origin_timestamp: 0,
            origin_core: 0,
            base_address: base,
            operation: VectorOperation::Load,
            suboperation: sub,
            element_width: 8,
            destination_register: None,
            source_register: None,
            indices,
            instruction_id: InstructionId(1),
            source_tile: TileId(0),
        }
    }

    #[test]
    fn scenario_5_unit_vector_load_8_elements_width_8_line_64() {
        let instr = instruction(VectorSuboperation::Unit, 0x2000, vec![]);
        let requests = decompose(&instr, 8, 64);
        // 8 * 8 = 64 bytes / 64-byte line = exactly one MC request.
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].address, 0x2000);
    }

    #[test]
    fn non_unit_emits_one_32_byte_request_per_element() {
        let instr = instruction(VectorSuboperation::NonUnit, 0x2000, vec![]);
        let requests = decompose(&instr, 4, 64);
        assert_eq!(requests.len(), 4);
        assert!(requests.iter().all(|r| r.size == 32));
    }
}
