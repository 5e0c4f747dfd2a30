//! Instruction table (spec.md §4.5 "Instruction table", §8 invariant 7):
//! one entry per in-flight `MCPUInstruction`, keyed by its monotonic
//! 32-bit id. `0` never appears here — it is the scalar-bypass sentinel.

use std::collections::HashMap;

use crate::error::InvariantViolation;
use crate::event::McpuInstruction;
use crate::ids::InstructionId;

pub struct InstructionEntry {
    pub instruction: McpuInstruction,
    pub outstanding_cache_requests: u32,
    pub outstanding_scratchpad_replies: u32,
    pub elements_per_response: u32,
    pub vvl_snapshot: u32,
    /// Count of per-element cache acks folded into the SP-WRITE batch
    /// currently being accumulated (NON_UNIT/indexed forms only; UNIT emits
    /// one SP-WRITE per ack so this stays `0`).
    pub elements_since_last_sp_write: u32,
    /// `ceil(vvl / elements_per_response)` (spec.md §4.5), the total number
    /// of SP-WRITEs this instruction is expected to emit.
    pub expected_sp_writes: u32,
    pub sp_writes_emitted: u32,
}

#[derive(Default)]
pub struct InstructionTable {
    entries: HashMap<u32, InstructionEntry>,
}

impl InstructionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        id: InstructionId,
        instruction: McpuInstruction,
        elements_per_response: u32,
        vvl_snapshot: u32,
    ) -> Result<(), InvariantViolation> {
        if self.entries.contains_key(&id.0) {
            return Err(InvariantViolation::InstructionIdCollision { id: id.0 });
        }
        let expected_sp_writes = crate::mem_tile::decompose::num_sp_writes(vvl_snapshot, elements_per_response);
        self.entries.insert(
            id.0,
            InstructionEntry {
                instruction,
                outstanding_cache_requests: 0,
                outstanding_scratchpad_replies: 0,
                elements_per_response,
                vvl_snapshot,
                elements_since_last_sp_write: 0,
                expected_sp_writes,
                sp_writes_emitted: 0,
            },
        );
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: InstructionId) -> Option<&InstructionEntry> {
        self.entries.get(&id.0)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: InstructionId) -> Option<&mut InstructionEntry> {
        self.entries.get_mut(&id.0)
    }

    #[must_use]
    pub fn contains(&self, id: InstructionId) -> bool {
        self.entries.contains_key(&id.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Removes the entry once every outstanding cache request and
    /// scratchpad reply has been accounted for.
    pub fn remove_if_complete(&mut self, id: InstructionId) -> bool {
        let Some(entry) = self.entries.get(&id.0) else { return false };
        if entry.outstanding_cache_requests == 0 && entry.outstanding_scratchpad_replies == 0 {
            self.entries.remove(&id.0);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{VectorOperation, VectorSuboperation};
    use crate::ids::TileId;

    fn dummy_instruction() -> McpuInstruction {
        McpuInstruction {
            pc: 0,
            origin_timestamp: 0,
            origin_core: 0,
            base_address: 0x2000,
            operation: VectorOperation::Load,
            suboperation: VectorSuboperation::Unit,
            element_width: 8,
            destination_register: None,
            source_register: None,
            indices: vec![],
            instruction_id: InstructionId(1),
            source_tile: TileId(0),
        }
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut table = InstructionTable::new();
        table.insert(InstructionId(1), dummy_instruction(), 1, 8).unwrap();
        let err = table.insert(InstructionId(1), dummy_instruction(), 1, 8).unwrap_err();
        assert!(matches!(err, InvariantViolation::InstructionIdCollision { id: 1 }));
    }

    #[test]
    fn entry_removed_once_all_outstanding_work_clears() {
        let mut table = InstructionTable::new();
        table.insert(InstructionId(1), dummy_instruction(), 1, 8).unwrap();
        table.get_mut(InstructionId(1)).unwrap().outstanding_cache_requests = 1;
        assert!(!table.remove_if_complete(InstructionId(1)));
        table.get_mut(InstructionId(1)).unwrap().outstanding_cache_requests = 0;
        assert!(table.remove_if_complete(InstructionId(1)));
    }
}
