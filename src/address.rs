//! Address type and line-address helpers shared across cache banks, the NoC and
//! the memory controller (spec.md §3, invariant 2: `line_address == address &
//! !(line_size - 1)`).

pub type Address = u64;
pub type Cycle = u64;

/// log2 of `n`, rounded down. `n` must be a power of two for callers that rely
/// on an exact bit width (cache geometry, mesh dimensions, ...).
#[must_use]
pub fn log2(n: u64) -> u32 {
    debug_assert!(n.is_power_of_two(), "log2 expects a power of two, got {n}");
    n.trailing_zeros()
}

/// Clears the low `log2(line_size)` bits of `addr`, producing the line address
/// that is this cache's unit of granularity.
#[must_use]
pub fn line_address(addr: Address, line_size: u32) -> Address {
    debug_assert!(line_size.is_power_of_two());
    addr & !(u64::from(line_size) - 1)
}

/// Extracts `width` bits starting at bit `shift` from `addr`.
#[must_use]
pub fn extract_bits(addr: Address, shift: u32, width: u32) -> u64 {
    if width == 0 {
        return 0;
    }
    let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
    (addr >> shift) & mask
}
