//! DRAM timing-constraint table (spec.md §4.4, §8 invariant 3). All values
//! are in cycles. Defaults are a generic DDR-ish profile, not tied to any
//! real part; callers needing a specific device should override every
//! field explicitly.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DramTiming {
    /// ACT → ACT, different bank group.
    pub trrds: u64,
    /// ACT → ACT, same bank group.
    pub trrdl: u64,
    /// ACT → ACT, same bank.
    pub trc: u64,
    /// PRE → ACT, same bank.
    pub trp: u64,
    /// ACT → RD, same bank.
    pub trcdrd: u64,
    /// ACT → WR, same bank.
    pub trcdwr: u64,
    /// ACT → PRE, same bank: `tras + trp` is the caller's job to add; this
    /// field stores `tras` alone.
    pub tras: u64,
    /// RD → PRE, same bank.
    pub trtp: u64,
    /// WR → PRE, same bank: combined with `twl` and burst length by the
    /// caller (`twr + twl + bl`).
    pub twr: u64,
    /// RD→RD / WR→WR, different bank group.
    pub tccds: u64,
    /// RD→RD / WR→WR, same bank group.
    pub tccdl: u64,
    /// RD → WR, same bank.
    pub trtw: u64,
    /// WR → RD, same bank: combined with `twl` and burst length
    /// (`twtrl + twl + bl`).
    pub twtrl: u64,
    /// Write latency, used to derive the `twr`/`twtrl` combined constraints.
    pub twl: u64,
    /// Burst length in cycles, used the same way.
    pub burst_length: u64,
}

impl Default for DramTiming {
    fn default() -> Self {
        Self {
            trrds: 4,
            trrdl: 6,
            trc: 46,
            trp: 13,
            trcdrd: 13,
            trcdwr: 13,
            tras: 33,
            trtp: 8,
            twr: 14,
            tccds: 4,
            tccdl: 6,
            trtw: 8,
            twtrl: 9,
            twl: 14,
            burst_length: 4,
        }
    }
}

impl DramTiming {
    /// ACT → PRE, same bank (spec.md §4.4: `tRAS + tRP`).
    #[must_use]
    pub fn act_to_pre(&self) -> u64 {
        self.tras + self.trp
    }

    /// WR → PRE, same bank (spec.md §4.4: `tWR + tWL + BL`).
    #[must_use]
    pub fn wr_to_pre(&self) -> u64 {
        self.twr + self.twl + self.burst_length
    }

    /// WR → RD, same bank (spec.md §4.4: `tWTRL + tWL + BL`).
    #[must_use]
    pub fn wr_to_rd(&self) -> u64 {
        self.twtrl + self.twl + self.burst_length
    }
}
