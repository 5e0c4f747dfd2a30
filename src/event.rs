//! The event/message model (spec.md §3, §4.1, §9 "Visitor dispatch → tagged
//! variants"). The original dispatches through a virtual `handle(visitor)`
//! call; here every event kind is a variant of one tagged enum and
//! [`EventVisitor`] gives components that need it the same "add a kind,
//! update every visitor" extension point without runtime indirection.

use crate::address::Address;
use crate::ids::{InstructionId, TileId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RegisterClass {
    Int,
    Float,
    Vector,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Register {
    pub id: u16,
    pub class: RegisterClass,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheRequestKind {
    Load,
    Store,
    Fetch,
    Writeback,
}

/// Memory-layout fields stamped onto a [`CacheRequest`] exactly once, by the
/// memory controller on entry (spec.md §3 invariant: "memory-layout fields
/// are set exactly once by the controller").
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MemoryLayout {
    pub controller: u16,
    pub rank: u16,
    pub bank: u16,
    pub row: u32,
    pub column: u32,
}

/// A load, store, fetch or writeback travelling from a core down to its
/// home cache bank and, on miss, to the memory subsystem.
///
/// Invariants (spec.md §3): `line_address == address & !(line_size - 1)`;
/// `home_tile`/`cache_bank` are set exactly once, before the request leaves
/// the originating tile's access director; `memory_layout` is set exactly
/// once, by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheRequest {
    pub pc: u64,
    pub origin_timestamp: u64,
    pub origin_core: u16,

    pub address: Address,
    pub size: u32,
    pub kind: CacheRequestKind,
    pub destination_register: Option<Register>,

    pub source_tile: TileId,
    pub home_tile: Option<TileId>,
    pub cache_bank: Option<usize>,
    pub line_address: Option<Address>,
    pub memory_layout: Option<MemoryLayout>,

    pub bypass_l2: bool,
    pub memory_ack: bool,
    pub serviced: bool,
    pub produced_by_vector: bool,

    /// `Some(id)` once this request is being serviced on behalf of an
    /// [`McpuInstruction`]; `None` (or `InstructionId::SCALAR_BYPASS`) for a
    /// scalar access using the bypass path (spec.md §4.5 "Bypass path").
    pub instruction_id: InstructionId,
    /// Set by a memory tile forwarding this request to another memory tile
    /// (spec.md §4.5 "Inter-MemTile forwarding").
    pub originator_memory_tile: Option<TileId>,
}

impl CacheRequest {
    #[must_use]
    pub fn new(
        pc: u64,
        origin_timestamp: u64,
        origin_core: u16,
        source_tile: TileId,
        address: Address,
        size: u32,
        kind: CacheRequestKind,
    ) -> Self {
        Self {
            pc,
            origin_timestamp,
            origin_core,
            address,
            size,
            kind,
            destination_register: None,
            source_tile,
            home_tile: None,
            cache_bank: None,
            line_address: None,
            memory_layout: None,
            bypass_l2: false,
            memory_ack: false,
            serviced: false,
            produced_by_vector: false,
            instruction_id: InstructionId::SCALAR_BYPASS,
            originator_memory_tile: None,
        }
    }

    /// Stamps `line_address`, enforcing the line-address-monotonicity
    /// invariant (spec.md §8 invariant 2) at the only call site allowed to
    /// set it.
    pub fn set_line_address(&mut self, line_size: u32) {
        self.line_address = Some(crate::address::line_address(self.address, line_size));
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScratchpadCommand {
    Allocate,
    Free,
    Read,
    Write,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScratchpadRequest {
    pub pc: u64,
    pub origin_timestamp: u64,
    pub origin_core: u16,

    pub address: Address,
    pub command: ScratchpadCommand,
    pub size: u32,
    pub destination_register_id: u16,
    pub source_tile: TileId,
    pub operand_ready: bool,
    pub parent_instruction: InstructionId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VectorOperation {
    Load,
    Store,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VectorSuboperation {
    Unit,
    NonUnit,
    OrderedIndex,
    UnorderedIndex,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct McpuInstruction {
    pub pc: u64,
    pub origin_timestamp: u64,
    pub origin_core: u16,

    pub base_address: Address,
    pub operation: VectorOperation,
    pub suboperation: VectorSuboperation,
    pub element_width: u32,
    pub destination_register: Option<Register>,
    pub source_register: Option<Register>,
    /// Index values for `ORDERED_INDEX`/`UNORDERED_INDEX`; empty otherwise.
    pub indices: Vec<u64>,
    pub instruction_id: InstructionId,
    pub source_tile: TileId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct McpuSetVvl {
    pub pc: u64,
    pub origin_timestamp: u64,
    pub origin_core: u16,

    pub avl: u32,
    pub element_width: u32,
    /// Signed power-of-two multiplier; positive widens, negative narrows
    /// (spec.md glossary "LMUL").
    pub lmul: i8,
    /// Filled in by the memory tile once computed; `None` until then.
    pub result_vvl: Option<u32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ControlEvent {
    pub origin_timestamp: u64,
    pub origin_core: u16,
}

/// The polymorphic event root (spec.md §3). A tagged enum stands in for the
/// source's virtual dispatch; [`EventVisitor`] recovers the "implement one
/// method per kind" ergonomics for components that consume several kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    CacheRequest(CacheRequest),
    ScratchpadRequest(ScratchpadRequest),
    McpuInstruction(McpuInstruction),
    McpuSetVvl(McpuSetVvl),
    Fence(ControlEvent),
    Finish(ControlEvent),
}

impl Event {
    #[must_use]
    pub fn origin_core(&self) -> u16 {
        match self {
            Event::CacheRequest(e) => e.origin_core,
            Event::ScratchpadRequest(e) => e.origin_core,
            Event::McpuInstruction(e) => e.origin_core,
            Event::McpuSetVvl(e) => e.origin_core,
            Event::Fence(e) | Event::Finish(e) => e.origin_core,
        }
    }

    #[must_use]
    pub fn origin_timestamp(&self) -> u64 {
        match self {
            Event::CacheRequest(e) => e.origin_timestamp,
            Event::ScratchpadRequest(e) => e.origin_timestamp,
            Event::McpuInstruction(e) => e.origin_timestamp,
            Event::McpuSetVvl(e) => e.origin_timestamp,
            Event::Fence(e) | Event::Finish(e) => e.origin_timestamp,
        }
    }

    pub fn dispatch<V: EventVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Event::CacheRequest(e) => visitor.visit_cache_request(e),
            Event::ScratchpadRequest(e) => visitor.visit_scratchpad_request(e),
            Event::McpuInstruction(e) => visitor.visit_mcpu_instruction(e),
            Event::McpuSetVvl(e) => visitor.visit_mcpu_set_vvl(e),
            Event::Fence(e) => visitor.visit_fence(e),
            Event::Finish(e) => visitor.visit_finish(e),
        }
    }
}

/// Implemented by components that react to more than one [`Event`] kind,
/// e.g. a cache bank handling both `CacheRequest` and scratchpad commands
/// reserved by configuration. Default methods are no-ops so a visitor only
/// overrides the kinds it cares about.
pub trait EventVisitor {
    type Output;

    fn visit_cache_request(&mut self, event: &CacheRequest) -> Self::Output;
    fn visit_scratchpad_request(&mut self, event: &ScratchpadRequest) -> Self::Output;
    fn visit_mcpu_instruction(&mut self, event: &McpuInstruction) -> Self::Output;
    fn visit_mcpu_set_vvl(&mut self, event: &McpuSetVvl) -> Self::Output;
    fn visit_fence(&mut self, event: &ControlEvent) -> Self::Output;
    fn visit_finish(&mut self, event: &ControlEvent) -> Self::Output;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageClass {
    Request,
    Reply,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NoCMessageKind {
    RemoteL2Request,
    RemoteL2Ack,
    MemoryRequestLoad,
    MemoryRequestStore,
    MemoryRequestWb,
    MemoryAck,
    McpuRequest,
    MemTileRequest,
    MemTileReply,
    ScratchpadCommand,
    ScratchpadDataReply,
    ScratchpadAck,
}

impl NoCMessageKind {
    /// Partitions message kinds into REQUEST/REPLY virtual networks
    /// (spec.md §4.6, invariant 6: "REQUEST-class and REPLY-class messages
    /// never share a queue inside the NoC").
    #[must_use]
    pub fn class(self) -> MessageClass {
        use NoCMessageKind::{
            MemTileReply, MemTileRequest, MemoryAck, MemoryRequestLoad, MemoryRequestStore,
            MemoryRequestWb, McpuRequest, RemoteL2Ack, RemoteL2Request, ScratchpadAck,
            ScratchpadCommand as ScratchpadCommandKind, ScratchpadDataReply,
        };
        match self {
            RemoteL2Request
            | MemoryRequestLoad
            | MemoryRequestStore
            | MemoryRequestWb
            | McpuRequest
            | MemTileRequest
            | ScratchpadCommandKind => MessageClass::Request,
            RemoteL2Ack | MemoryAck | MemTileReply | ScratchpadAck | ScratchpadDataReply => {
                MessageClass::Reply
            }
        }
    }
}

/// A message travelling through the NoC, wrapping exactly one [`Event`]
/// (spec.md §3, §6).
#[derive(Clone, Debug, PartialEq)]
pub struct NoCMessage {
    pub kind: NoCMessageKind,
    pub size_bits: u32,
    pub src_port: u16,
    pub dst_port: u16,
    pub payload: Box<Event>,
}

impl NoCMessage {
    #[must_use]
    pub fn new(kind: NoCMessageKind, size_bits: u32, src_port: u16, dst_port: u16, payload: Event) -> Self {
        Self {
            kind,
            size_bits,
            src_port,
            dst_port,
            payload: Box::new(payload),
        }
    }

    #[must_use]
    pub fn class(&self) -> MessageClass {
        self.kind.class()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_reply_kinds_never_share_a_class() {
        let requests = [
            NoCMessageKind::RemoteL2Request,
            NoCMessageKind::MemoryRequestLoad,
            NoCMessageKind::MemoryRequestStore,
            NoCMessageKind::MemoryRequestWb,
            NoCMessageKind::McpuRequest,
            NoCMessageKind::MemTileRequest,
            NoCMessageKind::ScratchpadCommand,
        ];
        let replies = [
            NoCMessageKind::RemoteL2Ack,
            NoCMessageKind::MemoryAck,
            NoCMessageKind::MemTileReply,
            NoCMessageKind::ScratchpadAck,
            NoCMessageKind::ScratchpadDataReply,
        ];
        assert!(requests.iter().all(|k| k.class() == MessageClass::Request));
        assert!(replies.iter().all(|k| k.class() == MessageClass::Reply));
    }

    #[test]
    fn cache_request_line_address_clears_offset_bits() {
        let mut req = CacheRequest::new(0, 0, 0, TileId(0), 0x1023, 8, CacheRequestKind::Load);
        req.set_line_address(64);
        assert_eq!(req.line_address, Some(0x1000));
    }
}
