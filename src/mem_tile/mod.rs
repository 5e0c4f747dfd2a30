//! Memory-tile agent ("MCPU") (spec.md §4.5) — the hardest subsystem: sits
//! between the NoC and a memory controller, fronts an optional LLC slice,
//! and decomposes vector memory operations into cache-line-sized requests
//! while coordinating with a remote per-vector-register scratchpad.

pub mod decompose;
pub mod instruction_table;
pub mod scratchpad;
pub mod vvl;

use crate::address::{Address, Cycle};
use crate::config::MemoryTileConfig;
use crate::error::InvariantViolation;
use crate::event::{
    CacheRequest, CacheRequestKind, McpuInstruction, McpuSetVvl, NoCMessageKind, ScratchpadCommand, ScratchpadRequest,
    VectorOperation, VectorSuboperation,
};
use crate::fifo::Fifo;
use crate::ids::{InstructionId, InstructionIdAllocator, MemoryTileId, TileId};

use instruction_table::InstructionTable;
use scratchpad::{AllocateOutcome, ScratchpadAllocator};

use stats::memory_tile::MemoryTile as MemoryTileStats;

/// Everything the memory tile needs to hand off to its neighbors: the
/// local memory controller, the NoC (for inter-memtile forwarding and
/// scratchpad traffic to the VAS tile), and an optional LLC.
pub trait MemoryTileDownstream {
    fn send_to_memory_controller(&mut self, request: CacheRequest, at: Cycle);
    fn send_to_llc(&mut self, request: CacheRequest, at: Cycle);
    fn forward_to_memory_tile(&mut self, destination: MemoryTileId, request: CacheRequest, at: Cycle);
    fn send_scratchpad_command(&mut self, request: ScratchpadRequest, at: Cycle);
    fn ack_to_home_tile(&mut self, request: CacheRequest, at: Cycle);
}

pub struct MemoryTile {
    pub id: MemoryTileId,
    config: MemoryTileConfig,
    /// Per-core VVL, set by the most recent `MCPUSetVVL` (spec.md §4.5).
    vvl_by_core: std::collections::HashMap<u16, u32>,
    instruction_ids: InstructionIdAllocator,
    pub table: InstructionTable,
    pub scratchpads: ScratchpadAllocator,

    sched_mem_req: Fifo<CacheRequest>,
    sched_outgoing: Fifo<ScratchpadRequest>,
    sched_incoming_mc: Fifo<CacheRequest>,

    pub stats: MemoryTileStats,
}

impl MemoryTile {
    #[must_use]
    pub fn new(id: MemoryTileId, config: MemoryTileConfig) -> Self {
        Self {
            id,
            config,
            vvl_by_core: std::collections::HashMap::new(),
            instruction_ids: InstructionIdAllocator::new(),
            table: InstructionTable::new(),
            scratchpads: ScratchpadAllocator::new(),
            sched_mem_req: Fifo::unbounded("sched_mem_req"),
            sched_outgoing: Fifo::unbounded("sched_outgoing"),
            sched_incoming_mc: Fifo::unbounded("sched_incoming_mc"),
            stats: MemoryTileStats { id: id.index(), ..Default::default() },
        }
    }

    /// `MCPUSetVVL` handler (spec.md §4.5 "VVL (vector length) protocol").
    pub fn set_vvl(&mut self, mut event: McpuSetVvl, downstream: &mut dyn MemoryTileDownstream, now: Cycle) -> McpuSetVvl {
        let result = vvl::compute_vvl(event.avl, event.element_width, event.lmul, self.config.sp_register_bytes);
        self.vvl_by_core.insert(event.origin_core, result);
        event.result_vvl = Some(result);
        self.stats.vvl_sets += 1;
        downstream.send_scratchpad_command(
            ScratchpadRequest {
                pc: event.pc,
                origin_timestamp: event.origin_timestamp,
                origin_core: event.origin_core,
                address: 0,
                command: ScratchpadCommand::Write,
                size: 8,
                destination_register_id: 0,
                source_tile: TileId(0),
                operand_ready: true,
                parent_instruction: InstructionId::SCALAR_BYPASS,
            },
            now + self.config.latency,
        );
        event
    }

    /// `calcDestMemTile(addr) = (addr >> mc_shift) & mc_mask` (spec.md
    /// §4.5 "Inter-MemTile forwarding").
    #[must_use]
    pub fn calc_dest_mem_tile(addr: Address, mc_shift: u32, mc_mask: u64, num_memory_tiles: u16) -> MemoryTileId {
        let index = (addr >> mc_shift) & mc_mask;
        MemoryTileId((index as usize) % usize::from(num_memory_tiles).max(1))
    }

    /// Admission control (spec.md §4.5 "Admission control"): refuses
    /// `MCPU_REQUEST`-class messages while any instruction is in the
    /// table; everything else is always accepted.
    #[must_use]
    pub fn can_accept(&self, kind: NoCMessageKind) -> bool {
        if kind == NoCMessageKind::McpuRequest {
            self.table.is_empty()
        } else {
            true
        }
    }

    /// Entry point for a scalar `CacheRequest` with `instruction_id == 0`
    /// (spec.md §4.5 "Bypass path").
    pub fn handle_bypass_request(
        &mut self,
        mut request: CacheRequest,
        mc_shift: u32,
        mc_mask: u64,
        num_memory_tiles: u16,
        downstream: &mut dyn MemoryTileDownstream,
        now: Cycle,
    ) {
        debug_assert!(request.instruction_id.is_scalar_bypass());
        request.size = self.config.line_size;
        self.stats.bypass_requests += 1;
        let destination = Self::calc_dest_mem_tile(request.address, mc_shift, mc_mask, num_memory_tiles);
        if destination == self.id {
            self.route_to_backing_store(request, downstream, now);
        } else {
            request.originator_memory_tile = Some(TileId(self.id.index()));
            self.stats.forwarded_to_other_tile += 1;
            downstream.forward_to_memory_tile(destination, request, now + self.config.latency);
        }
    }

    fn route_to_backing_store(&mut self, request: CacheRequest, downstream: &mut dyn MemoryTileDownstream, now: Cycle) {
        if self.config.llc_enabled {
            downstream.send_to_llc(request, now + self.config.latency);
        } else {
            downstream.send_to_memory_controller(request, now + self.config.latency);
        }
    }

    /// Admits a fresh `MCPUInstruction`: allocates its table entry and kicks
    /// off address generation (spec.md §4.5 "Instruction table", "Vector
    /// LOAD address generation", "Vector STORE"). `ORDERED_INDEX`/
    /// `UNORDERED_INDEX` forms fetch their index vector from the
    /// scratchpad first and defer to [`MemoryTile::on_index_reply`]; a
    /// STORE (indexed or not) additionally needs its operand data pulled
    /// from the scratchpad before any cache request can carry it, handled
    /// by [`MemoryTile::on_operand_data_reply`]. A non-indexed LOAD has
    /// nothing to wait on and decomposes immediately.
    pub fn admit_instruction(
        &mut self,
        instruction: McpuInstruction,
        downstream: &mut dyn MemoryTileDownstream,
        now: Cycle,
    ) -> Result<InstructionId, InvariantViolation> {
        let id = self.instruction_ids.alloc();
        let vvl = self.vvl_by_core.get(&instruction.origin_core).copied().unwrap_or(0);
        let elements_per_response = decompose::elements_per_response(&instruction, self.config.line_size);
        let mut instruction = instruction;
        instruction.instruction_id = id;
        self.table.insert(id, instruction.clone(), elements_per_response, vvl)?;
        self.stats.instructions_decomposed += 1;

        if matches!(instruction.suboperation, VectorSuboperation::OrderedIndex | VectorSuboperation::UnorderedIndex) {
            self.request_index_data(id, &instruction, vvl, downstream, now);
        } else if instruction.operation == VectorOperation::Store {
            self.request_operand_data(id, &instruction, vvl, downstream, now);
        } else {
            self.emit_element_requests(id, &instruction, vvl, downstream, now);
        }
        Ok(id)
    }

    fn request_index_data(
        &mut self,
        id: InstructionId,
        instruction: &McpuInstruction,
        vvl: u32,
        downstream: &mut dyn MemoryTileDownstream,
        now: Cycle,
    ) {
        downstream.send_scratchpad_command(
            ScratchpadRequest {
                pc: instruction.pc,
                origin_timestamp: instruction.origin_timestamp,
                origin_core: instruction.origin_core,
                address: instruction.base_address,
                command: ScratchpadCommand::Read,
                size: vvl * 8,
                destination_register_id: instruction.source_register.map(|r| r.id).unwrap_or(0),
                source_tile: instruction.source_tile,
                operand_ready: false,
                parent_instruction: id,
            },
            now + self.config.latency,
        );
    }

    /// The index SP-READ issued by [`Self::request_index_data`] landed: the
    /// index vector is timing-only in this simulator (no payload to carry,
    /// the instruction's `indices` were already resolved at admission), so
    /// this is purely a scheduling handoff to whatever comes next — operand
    /// fetch for a STORE, straight to decomposition for a LOAD.
    pub fn on_index_reply(&mut self, id: InstructionId, downstream: &mut dyn MemoryTileDownstream, now: Cycle) {
        let Some(entry) = self.table.get(id) else { return };
        let instruction = entry.instruction.clone();
        let vvl = entry.vvl_snapshot;
        if instruction.operation == VectorOperation::Store {
            self.request_operand_data(id, &instruction, vvl, downstream, now);
        } else {
            self.emit_element_requests(id, &instruction, vvl, downstream, now);
        }
    }

    fn request_operand_data(
        &mut self,
        id: InstructionId,
        instruction: &McpuInstruction,
        vvl: u32,
        downstream: &mut dyn MemoryTileDownstream,
        now: Cycle,
    ) {
        let register = instruction.source_register.map(|r| r.id).unwrap_or(0);
        downstream.send_scratchpad_command(
            ScratchpadRequest {
                pc: instruction.pc,
                origin_timestamp: instruction.origin_timestamp,
                origin_core: instruction.origin_core,
                address: instruction.base_address,
                command: ScratchpadCommand::Read,
                size: vvl * instruction.element_width,
                destination_register_id: register,
                source_tile: instruction.source_tile,
                operand_ready: false,
                parent_instruction: id,
            },
            now + self.config.latency,
        );
    }

    /// The operand SP-READ issued by [`Self::request_operand_data`] landed:
    /// the STORE's source data is present, so the element/line requests can
    /// finally be generated and issued to the memory controller.
    pub fn on_operand_data_reply(&mut self, id: InstructionId, downstream: &mut dyn MemoryTileDownstream, now: Cycle) {
        let Some(entry) = self.table.get(id) else { return };
        let instruction = entry.instruction.clone();
        let vvl = entry.vvl_snapshot;
        self.emit_element_requests(id, &instruction, vvl, downstream, now);
    }

    fn emit_element_requests(
        &mut self,
        id: InstructionId,
        instruction: &McpuInstruction,
        vvl: u32,
        downstream: &mut dyn MemoryTileDownstream,
        now: Cycle,
    ) {
        let requests = decompose::decompose(instruction, vvl, self.config.line_size);
        self.stats.element_requests_issued += requests.len() as u64;
        if let Some(entry) = self.table.get_mut(id) {
            entry.outstanding_cache_requests += requests.len() as u32;
        }
        for element in requests {
            let kind = match instruction.operation {
                crate::event::VectorOperation::Load => CacheRequestKind::Load,
                crate::event::VectorOperation::Store => CacheRequestKind::Store,
            };
            let mut request = CacheRequest::new(
                instruction.pc,
                instruction.origin_timestamp,
                instruction.origin_core,
                instruction.source_tile,
                element.address,
                element.size,
                kind,
            );
            request.instruction_id = id;
            request.produced_by_vector = true;
            self.sched_mem_req.try_push(request.clone()).ok();
            downstream.send_to_memory_controller(request, now + self.config.latency);
        }
    }

    /// An element request's ack lands: decrements the instruction's
    /// outstanding cache-request counter and folds the ack into the
    /// current SP-WRITE batch. UNIT acks arrive one per cache line and each
    /// already carries a full `elements_per_response`-sized batch, so every
    /// ack emits its own SP-WRITE; NON_UNIT/indexed acks arrive one per
    /// 32-byte element, so `elements_per_response` of them are folded into
    /// a single SP-WRITE (spec.md §4.5: "outgoing SP-WRITEs =
    /// `ceil(vvl / elements_per_response)`"), with the final, possibly
    /// partial, batch flushed once no cache requests remain outstanding.
    pub fn on_element_ack(&mut self, id: InstructionId, downstream: &mut dyn MemoryTileDownstream, now: Cycle) {
        let Some(entry) = self.table.get_mut(id) else {
            self.table.remove_if_complete(id);
            return;
        };
        entry.outstanding_cache_requests = entry.outstanding_cache_requests.saturating_sub(1);
        let last_ack = entry.outstanding_cache_requests == 0;
        let is_unit = matches!(entry.instruction.suboperation, VectorSuboperation::Unit);

        let flush_batch = if is_unit {
            true
        } else {
            entry.elements_since_last_sp_write += 1;
            entry.elements_since_last_sp_write >= entry.elements_per_response.max(1) || last_ack
        };

        if !flush_batch {
            self.table.remove_if_complete(id);
            return;
        }
        if !is_unit {
            entry.elements_since_last_sp_write = 0;
        }

        entry.outstanding_scratchpad_replies += 1;
        entry.sp_writes_emitted += 1;
        if last_ack {
            debug_assert_eq!(
                entry.sp_writes_emitted, entry.expected_sp_writes,
                "SP-WRITEs emitted must match ceil(vvl / elements_per_response)"
            );
        }
        self.stats.scratchpad_writes += 1;
        let register = entry.instruction.destination_register.map(|r| r.id).unwrap_or(0);
        let reply = ScratchpadRequest {
            pc: entry.instruction.pc,
            origin_timestamp: entry.instruction.origin_timestamp,
            origin_core: entry.instruction.origin_core,
            address: entry.instruction.base_address,
            command: ScratchpadCommand::Write,
            size: entry.instruction.element_width,
            destination_register_id: register,
            source_tile: entry.instruction.source_tile,
            operand_ready: true,
            parent_instruction: id,
        };
        match self.scratchpads.on_sp_write(register, reply) {
            AllocateOutcome::NeedsAllocate => {
                self.stats.scratchpad_allocates += 1;
                downstream.send_scratchpad_command(
                    ScratchpadRequest {
                        pc: 0,
                        origin_timestamp: now,
                        origin_core: entry.instruction.origin_core,
                        address: 0,
                        command: ScratchpadCommand::Allocate,
                        size: entry.instruction.element_width,
                        destination_register_id: register,
                        source_tile: entry.instruction.source_tile,
                        operand_ready: false,
                        parent_instruction: id,
                    },
                    now + self.config.latency,
                );
            }
            AllocateOutcome::Ready => {
                if let Some(entry) = self.table.get_mut(id) {
                    entry.outstanding_scratchpad_replies = entry.outstanding_scratchpad_replies.saturating_sub(1);
                }
            }
            AllocateOutcome::Queued => {}
        }
        self.table.remove_if_complete(id);
    }

    /// The VAS tile's ALLOCATE ack for `register` landed: drains every
    /// SP-WRITE that had been queued on its delay-queue, forwards each one
    /// downstream, and frees the outstanding-scratchpad-reply credit it had
    /// been holding against its parent instruction (spec.md §4.5
    /// "Scratchpad allocation"). Without this, a first-touch register's
    /// instruction entry would hold its credit forever.
    pub fn on_allocate_ack(&mut self, register: u16, downstream: &mut dyn MemoryTileDownstream, now: Cycle) {
        for request in self.scratchpads.on_allocate_ack(register) {
            let parent = request.parent_instruction;
            downstream.send_scratchpad_command(request, now + self.config.latency);
            if let Some(entry) = self.table.get_mut(parent) {
                entry.outstanding_scratchpad_replies = entry.outstanding_scratchpad_replies.saturating_sub(1);
            }
            self.table.remove_if_complete(parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Register, RegisterClass};
    use crate::ids::TileId;

    #[derive(Default)]
    struct RecordingDownstream {
        to_mc: Vec<CacheRequest>,
        scratchpad_commands: Vec<ScratchpadRequest>,
    }

    impl MemoryTileDownstream for RecordingDownstream {
        fn send_to_memory_controller(&mut self, request: CacheRequest, _at: Cycle) {
            self.to_mc.push(request);
        }
        fn send_to_llc(&mut self, _request: CacheRequest, _at: Cycle) {}
        fn forward_to_memory_tile(&mut self, _destination: MemoryTileId, _request: CacheRequest, _at: Cycle) {}
        fn send_scratchpad_command(&mut self, request: ScratchpadRequest, _at: Cycle) {
            self.scratchpad_commands.push(request);
        }
        fn ack_to_home_tile(&mut self, _request: CacheRequest, _at: Cycle) {}
    }

    fn tile() -> MemoryTile {
        MemoryTile::new(MemoryTileId(0), MemoryTileConfig::default())
    }

    fn vector_load(sub: VectorSuboperation, indices: Vec<u64>) -> McpuInstruction {
        McpuInstruction {
            pc: 0,
            origin_timestamp: 0,
            origin_core: 0,
            base_address: 0x4000,
            operation: VectorOperation::Load,
            suboperation: sub,
            element_width: 8,
            destination_register: Some(Register { id: 3, class: RegisterClass::Vector }),
            source_register: None,
            indices,
            instruction_id: InstructionId(0),
            source_tile: TileId(0),
        }
    }

    #[test]
    fn non_unit_load_batches_sp_writes_per_elements_per_response() {
        let mut mt = tile();
        let mut downstream = RecordingDownstream::default();
        mt.vvl_by_core.insert(0, 16);
        let id = mt
            .admit_instruction(vector_load(VectorSuboperation::NonUnit, vec![]), &mut downstream, 0)
            .unwrap();
        // line_size(64)/width(8) = 8 elements per response; vvl 16 -> ceil(16/8) = 2 SP-WRITEs.
        assert_eq!(downstream.to_mc.len(), 16);
        for _ in 0..16 {
            mt.on_element_ack(id, &mut downstream, 0);
        }
        assert_eq!(downstream.scratchpad_commands.iter().filter(|r| r.command == ScratchpadCommand::Write).count(), 2);
        assert!(!mt.table.contains(id));
    }

    #[test]
    fn indexed_load_fetches_indices_before_decomposing() {
        let mut mt = tile();
        let mut downstream = RecordingDownstream::default();
        mt.vvl_by_core.insert(0, 2);
        let id = mt
            .admit_instruction(vector_load(VectorSuboperation::OrderedIndex, vec![0x10, 0x20]), &mut downstream, 0)
            .unwrap();
        assert!(downstream.to_mc.is_empty());
        assert_eq!(downstream.scratchpad_commands.last().unwrap().command, ScratchpadCommand::Read);
        mt.on_index_reply(id, &mut downstream, 0);
        assert_eq!(downstream.to_mc.len(), 2);
    }

    #[test]
    fn vector_store_fetches_operand_data_before_decomposing() {
        let mut mt = tile();
        let mut downstream = RecordingDownstream::default();
        mt.vvl_by_core.insert(0, 8);
        let mut instruction = vector_load(VectorSuboperation::Unit, vec![]);
        instruction.operation = VectorOperation::Store;
        instruction.source_register = Some(Register { id: 5, class: RegisterClass::Vector });
        let id = mt.admit_instruction(instruction, &mut downstream, 0).unwrap();
        assert!(downstream.to_mc.is_empty());
        let operand_read = downstream.scratchpad_commands.last().unwrap();
        assert_eq!(operand_read.command, ScratchpadCommand::Read);
        assert_eq!(operand_read.destination_register_id, 5);
        mt.on_operand_data_reply(id, &mut downstream, 0);
        assert_eq!(downstream.to_mc.len(), 1);
        assert!(downstream.to_mc.iter().all(|r| r.kind == CacheRequestKind::Store));
    }

    #[test]
    fn first_touch_register_completes_once_allocate_ack_drains() {
        let mut mt = tile();
        let mut downstream = RecordingDownstream::default();
        mt.vvl_by_core.insert(0, 8);
        let id = mt
            .admit_instruction(vector_load(VectorSuboperation::Unit, vec![]), &mut downstream, 0)
            .unwrap();
        assert_eq!(downstream.to_mc.len(), 1);
        mt.on_element_ack(id, &mut downstream, 0);
        // Register 3 is untouched -> NeedsAllocate was issued and the entry
        // still holds its scratchpad-reply credit until the ack drains it.
        assert!(mt.table.contains(id));
        mt.on_allocate_ack(3, &mut downstream, 0);
        assert!(!mt.table.contains(id));
    }
}
