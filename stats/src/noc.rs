use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Packets injected per (source, destination, virtual-network class).
///
/// Keyed the way `SimpleNoC` keys its per (src, dst, class) packet counters;
/// flushed to a report at the cadence the caller chooses, not continuously.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Noc {
    pub packets: IndexMap<(u16, u16, u8), u64>,
    pub injection_stalls: u64,
    pub hops_total: u64,
}

impl Noc {
    pub fn record_packet(&mut self, src: u16, dst: u16, class: u8, hops: u64) {
        *self.packets.entry((src, dst, class)).or_insert(0) += 1;
        self.hops_total += hops;
    }
}

impl std::ops::AddAssign for Noc {
    fn add_assign(&mut self, other: Self) {
        for (key, count) in other.packets {
            *self.packets.entry(key).or_insert(0) += count;
        }
        self.injection_stalls += other.injection_stalls;
        self.hops_total += other.hops_total;
    }
}
