//! Newtype ids resolved through the arenas held by [`crate::world::World`]
//! (spec.md §9 design note: "arena of ids, not `Rc` cycles", grounded on the
//! `SubPartitionId`/cluster-index style indices in `mem_sub_partition.rs` and
//! `cluster.rs`). Each id is a thin `usize` wrapper so components refer to
//! each other without holding a borrow across a callback.

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub usize);

        impl $name {
            #[must_use]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

define_id!(TileId);
define_id!(CacheBankId);
define_id!(ArbiterId);
define_id!(MemoryControllerId);
define_id!(MemoryBankId);
define_id!(MemoryTileId);
define_id!(NocId);

/// Monotonically increasing 32-bit id for memory-tile vector instructions.
/// `0` is reserved to mean "scalar bypass, no instruction-table entry"
/// (original_source `MemoryCPUWrapper.hpp`: `instructionID_counter` starts
/// at 1).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstructionId(pub u32);

impl InstructionId {
    pub const SCALAR_BYPASS: InstructionId = InstructionId(0);

    #[must_use]
    pub fn is_scalar_bypass(self) -> bool {
        self.0 == 0
    }
}

/// Issues monotonically increasing [`InstructionId`]s starting at 1, wrapping
/// around `0` (which stays reserved) rather than at `u32::MAX`.
#[derive(Debug, Default)]
pub struct InstructionIdAllocator {
    next: u32,
}

impl InstructionIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn alloc(&mut self) -> InstructionId {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        if self.next == 0 {
            self.next = 1;
        }
        InstructionId(id)
    }
}
