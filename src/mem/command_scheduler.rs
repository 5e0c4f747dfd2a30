//! Command scheduler (spec.md §4.4 point 2): for each bank's head request,
//! decides ACTIVATE/PRECHARGE/READ/WRITE and defers it if timing disallows,
//! honouring the `oldest-RW-over-precharge` reordering policy.

use crate::address::Cycle;
use crate::config::{CommandSchedulerPolicy, DramTiming};
use crate::event::{CacheRequest, CacheRequestKind};
use crate::mem::bank::{check_timing, MemoryBank, RowState};
use crate::mem::command::{BankCommand, CommandKind};

/// Given the bank's current row state and `request`'s target row, picks
/// the single command needed next: ACT if closed, PRE if open to the wrong
/// row, else RD/WR (spec.md §4.4 point 1, last sentence).
#[must_use]
pub fn next_command_for_request(bank: &MemoryBank, request: &CacheRequest, row: u32, column: u32) -> BankCommand {
    match bank.state() {
        RowState::Closed => BankCommand::activate(bank.id, row),
        RowState::Open => {
            if bank.open_row() != Some(row) {
                BankCommand::precharge(bank.id)
            } else {
                let kind = if matches!(request.kind, CacheRequestKind::Store | CacheRequestKind::Writeback) {
                    CommandKind::Write
                } else {
                    CommandKind::Read
                };
                BankCommand::read_or_write(kind, bank.id, column, request.clone(), true)
            }
        }
    }
}

/// Checks `command` against `bank`'s timing state. Returns `true` if it may
/// issue at `now`.
#[must_use]
pub fn timing_allows(
    bank: &MemoryBank,
    command: &BankCommand,
    now: Cycle,
    timing: &DramTiming,
    last_activate_same_group: Option<Cycle>,
    last_rw_same_group: Option<Cycle>,
) -> bool {
    check_timing(bank, command.kind, now, timing, last_activate_same_group, last_rw_same_group).is_none()
}

/// `fifo`: only the head command is ever considered, so a timing failure
/// simply defers. `oldest-RW-over-precharge`: among the bank's waiting
/// commands, a command of kind READ/WRITE is preferred over PRECHARGE if
/// the oldest PRECHARGE hasn't cleared timing yet. With one command in
/// flight per bank at a time this reduces to: if the chosen command fails
/// timing and it is a PRECHARGE, and the head request could instead be
/// served by deferring (i.e., there is nothing else to do), it simply waits
/// — the reordering policy only has teeth once multiple banks are
/// considered by the caller, which tries every ready bank each cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommandSchedulerPolicyImpl(pub CommandSchedulerPolicy);

impl CommandSchedulerPolicyImpl {
    #[must_use]
    pub fn prefers_rw_over_precharge(&self) -> bool {
        matches!(self.0, CommandSchedulerPolicy::OldestRwOverPrecharge)
    }
}
