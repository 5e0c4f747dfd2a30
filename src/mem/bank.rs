//! DRAM bank state machine (spec.md §3 `MemoryBank state`, §4.4), grounded
//! on the per-bank open/closed row tracking in `mem_sub_partition.rs`'s
//! DRAM-facing queues, generalized to a real timing model since the
//! teacher treats DRAM as a fixed-latency black box and Coyote does not.

use std::collections::HashMap;

use crate::address::Cycle;
use crate::config::DramTiming;
use crate::ids::MemoryBankId;
use crate::mem::command::CommandKind;

use stats::dram::Dram as DramStats;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowState {
    Open,
    Closed,
}

/// Last-issued timestamp per command class, needed to check every timing
/// constraint in spec.md §4.4 before a new command issues.
#[derive(Default)]
struct LastIssued {
    activate: Option<Cycle>,
    precharge: Option<Cycle>,
    read: Option<Cycle>,
    write: Option<Cycle>,
}

pub struct MemoryBank {
    pub id: MemoryBankId,
    pub bank_group: u16,
    state: RowState,
    open_row: Option<u32>,
    last: LastIssued,
    pub rows: u32,
    pub columns: u32,
    pub stats: DramStats,
}

impl MemoryBank {
    #[must_use]
    pub fn new(id: MemoryBankId, bank_group: u16, rows: u32, columns: u32) -> Self {
        Self {
            id,
            bank_group,
            state: RowState::Closed,
            open_row: None,
            last: LastIssued::default(),
            rows,
            columns,
            stats: DramStats { bank_id: id.index(), ..Default::default() },
        }
    }

    #[must_use]
    pub fn state(&self) -> RowState {
        self.state
    }

    #[must_use]
    pub fn open_row(&self) -> Option<u32> {
        self.open_row
    }

    #[must_use]
    pub fn last_issued(&self, kind: CommandKind) -> Option<Cycle> {
        match kind {
            CommandKind::Activate => self.last.activate,
            CommandKind::Precharge => self.last.precharge,
            CommandKind::Read => self.last.read,
            CommandKind::Write => self.last.write,
        }
    }

    /// Applies `kind` as if it has just been issued at `now`, updating open
    /// row and the last-issued table used by the next timing check.
    pub fn apply(&mut self, kind: CommandKind, now: Cycle, row_or_column: u32) {
        match kind {
            CommandKind::Activate => {
                self.state = RowState::Open;
                self.open_row = Some(row_or_column);
                self.last.activate = Some(now);
                self.stats.activates += 1;
            }
            CommandKind::Precharge => {
                self.state = RowState::Closed;
                self.open_row = None;
                self.last.precharge = Some(now);
                self.stats.precharges += 1;
            }
            CommandKind::Read => {
                self.last.read = Some(now);
                self.stats.reads += 1;
            }
            CommandKind::Write => {
                self.last.write = Some(now);
                self.stats.writes += 1;
            }
        }
    }
}

/// Checks whether issuing `kind` at `now` on `bank` honours every applicable
/// constraint against `other_banks_same_group` (for the bank-group
/// constraints) and the bank's own history. Returns the first violated
/// constraint's minimum gap, or `None` if timing allows.
#[must_use]
pub fn check_timing(
    bank: &MemoryBank,
    kind: CommandKind,
    now: Cycle,
    timing: &DramTiming,
    last_activate_same_group: Option<Cycle>,
    last_rw_same_group: Option<Cycle>,
) -> Option<Cycle> {
    let gap_ok = |last: Option<Cycle>, min_gap: Cycle| match last {
        None => true,
        Some(l) => now.saturating_sub(l) >= min_gap,
    };

    match kind {
        CommandKind::Activate => {
            if !gap_ok(bank.last.activate, timing.trc) {
                return Some(timing.trc);
            }
            if !gap_ok(last_activate_same_group, timing.trrdl) {
                return Some(timing.trrdl);
            }
            if !gap_ok(bank.last.precharge, timing.trp) {
                return Some(timing.trp);
            }
            None
        }
        CommandKind::Precharge => {
            if bank.state != RowState::Open {
                return None;
            }
            if !gap_ok(bank.last.activate, timing.act_to_pre()) {
                return Some(timing.act_to_pre());
            }
            if !gap_ok(bank.last.read, timing.trtp) {
                return Some(timing.trtp);
            }
            if !gap_ok(bank.last.write, timing.wr_to_pre()) {
                return Some(timing.wr_to_pre());
            }
            None
        }
        CommandKind::Read => {
            if !gap_ok(bank.last.activate, timing.trcdrd) {
                return Some(timing.trcdrd);
            }
            if !gap_ok(bank.last.read, timing.tccdl) {
                return Some(timing.tccdl);
            }
            if !gap_ok(last_rw_same_group, timing.tccds) {
                return Some(timing.tccds);
            }
            if !gap_ok(bank.last.write, timing.wr_to_rd()) {
                return Some(timing.wr_to_rd());
            }
            None
        }
        CommandKind::Write => {
            if !gap_ok(bank.last.activate, timing.trcdwr) {
                return Some(timing.trcdwr);
            }
            if !gap_ok(bank.last.write, timing.tccdl) {
                return Some(timing.tccdl);
            }
            if !gap_ok(last_rw_same_group, timing.tccds) {
                return Some(timing.tccds);
            }
            if !gap_ok(bank.last.read, timing.trtw) {
                return Some(timing.trtw);
            }
            None
        }
    }
}

pub type BankIndex = HashMap<MemoryBankId, MemoryBank>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_then_read_respects_trcdrd() {
        let mut bank = MemoryBank::new(MemoryBankId(0), 0, 1 << 15, 1 << 10);
        let timing = DramTiming::default();
        bank.apply(CommandKind::Activate, 0, 5);
        assert!(check_timing(&bank, CommandKind::Read, 1, &timing, None, None).is_some());
        assert!(check_timing(&bank, CommandKind::Read, timing.trcdrd, &timing, None, None).is_none());
    }

    #[test]
    fn precharge_before_tras_plus_trp_is_deferred() {
        let mut bank = MemoryBank::new(MemoryBankId(0), 0, 1 << 15, 1 << 10);
        let timing = DramTiming::default();
        bank.apply(CommandKind::Activate, 0, 5);
        assert!(check_timing(&bank, CommandKind::Precharge, 5, &timing, None, None).is_some());
        assert!(
            check_timing(&bank, CommandKind::Precharge, timing.act_to_pre(), &timing, None, None).is_none()
        );
    }
}
