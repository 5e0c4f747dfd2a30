//! Network-on-chip (spec.md §4.6): three interchangeable variants behind one
//! trait (spec.md §9 "Deep inheritance of `NoC` ... collapse to a
//! trait/interface with three ... variants selected by configuration at
//! startup").

pub mod detailed;
pub mod functional;
pub mod simple;

use crate::address::Cycle;
use crate::event::NoCMessage;
use crate::ids::NocId;

pub use detailed::DetailedNoc;
pub use functional::FunctionalNoc;
pub use simple::SimpleNoc;

/// Destination a message is routed to: either a tile or a memory tile,
/// identified by their NoC port id (spec.md §3 NoC "weak references" to
/// every tile/memory-tile it serves).
pub type Port = u16;

/// Common interface every NoC variant implements (spec.md §4.6).
pub trait Noc {
    /// Backpressure hook called by the arbiter before injection
    /// (spec.md §4.6 `check_space_for_packet`).
    fn check_space_for_packet(&self, injected_by: Port, message: &NoCMessage) -> bool;

    /// Injects `message` from `injected_by` at `now`; caller must have
    /// already checked [`Noc::check_space_for_packet`].
    fn inject(&mut self, injected_by: Port, message: NoCMessage, now: Cycle);

    /// Steps the NoC by one Coyote cycle, draining any messages that
    /// complete their traversal this cycle into `deliver`.
    fn cycle(&mut self, now: Cycle, deliver: &mut dyn FnMut(Port, NoCMessage, Cycle));

    fn id(&self) -> NocId;
}
