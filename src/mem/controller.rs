//! Memory controller (spec.md §4.4): address decoding, two-level
//! scheduling, and ack emission. Grounded on the L2-to-DRAM queue
//! orchestration in `mem_sub_partition.rs`'s `cycle()` (fill-response →
//! dram-to-l2 → cycle → new-access ordering becomes access-scheduler →
//! command-scheduler → issue here).

use crate::address::{Address, Cycle};
use crate::config::{AddressMappingPolicy, CommandSchedulerPolicy, MemoryConfig};
use crate::event::{CacheRequest, CacheRequestKind};
use crate::ids::{MemoryBankId, MemoryControllerId};
use crate::mem::access_scheduler::AccessScheduler;
use crate::mem::bank::{check_timing, MemoryBank};
use crate::mem::command::CommandKind;
use crate::mem::command_scheduler::{next_command_for_request, CommandSchedulerPolicyImpl};

use stats::memory_controller::MemoryController as MemoryControllerStats;

/// Decoded (rank, bank, row, column) for an address under the controller's
/// configured mapping policy (spec.md §4.4 "Address decoding").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodedAddress {
    pub rank: u16,
    pub bank: u16,
    pub row: u32,
    pub column: u32,
}

#[must_use]
pub fn decode_address(addr: Address, policy: AddressMappingPolicy, num_banks: u64, rows: u32, columns: u32) -> DecodedAddress {
    let column_bits = crate::address::log2(u64::from(columns));
    let bank_bits = crate::address::log2(num_banks.next_power_of_two());
    let row_bits = crate::address::log2(u64::from(rows));

    let (bank, row, column) = match policy {
        AddressMappingPolicy::OpenPage | AddressMappingPolicy::ClosePage => {
            let column = crate::address::extract_bits(addr, 0, column_bits) as u32;
            let bank = crate::address::extract_bits(addr, column_bits, bank_bits) as u16;
            let row = crate::address::extract_bits(addr, column_bits + bank_bits, row_bits) as u32;
            (bank, row, column)
        }
        AddressMappingPolicy::RowColumnBank => {
            let bank = crate::address::extract_bits(addr, 0, bank_bits) as u16;
            let column = crate::address::extract_bits(addr, bank_bits, column_bits) as u32;
            let row = crate::address::extract_bits(addr, bank_bits + column_bits, row_bits) as u32;
            (bank, row, column)
        }
        AddressMappingPolicy::BankRowColumn => {
            let column = crate::address::extract_bits(addr, 0, column_bits) as u32;
            let row = crate::address::extract_bits(addr, column_bits, row_bits) as u32;
            let bank = crate::address::extract_bits(addr, column_bits + row_bits, bank_bits) as u16;
            (bank, row, column)
        }
        AddressMappingPolicy::RowBankColumnBankGroupInterleave => {
            let column = crate::address::extract_bits(addr, 0, column_bits) as u32;
            let bank = crate::address::extract_bits(addr, column_bits, bank_bits) as u16;
            let row = crate::address::extract_bits(addr, column_bits + bank_bits, row_bits) as u32;
            (bank, row, column)
        }
    };
    DecodedAddress { rank: 0, bank, row, column }
}

pub trait ControllerDownstream {
    fn ack(&mut self, request: CacheRequest, at: Cycle);
    /// A STORE under write-allocate triggers a refill READ-stream before
    /// acking (spec.md §4.4 "Completion and ack").
    fn refill_read(&mut self, request: CacheRequest, at: Cycle);
}

pub struct MemoryController {
    pub id: MemoryControllerId,
    config: MemoryConfig,
    banks: Vec<MemoryBank>,
    access_scheduler: AccessScheduler,
    command_policy: CommandSchedulerPolicyImpl,
    last_activate_by_group: std::collections::HashMap<u16, Cycle>,
    last_rw_by_group: std::collections::HashMap<u16, Cycle>,
    running: bool,
    pub stats: MemoryControllerStats,
}

impl MemoryController {
    #[must_use]
    pub fn new(id: MemoryControllerId, config: MemoryConfig, num_banks: u64) -> Self {
        let bank_ids: Vec<MemoryBankId> = (0..num_banks).map(|i| MemoryBankId(i as usize)).collect();
        let banks = bank_ids
            .iter()
            .map(|&bid| MemoryBank::new(bid, (bid.index() as u16) % 4, config.rows, config.columns))
            .collect();
        let access_scheduler = AccessScheduler::new(config.access_scheduler_policy, &bank_ids);
        let command_policy = CommandSchedulerPolicyImpl(config.command_scheduler_policy);
        Self {
            id,
            config,
            banks,
            access_scheduler,
            command_policy,
            last_activate_by_group: std::collections::HashMap::new(),
            last_rw_by_group: std::collections::HashMap::new(),
            running: false,
            stats: MemoryControllerStats { id: id.index(), ..Default::default() },
        }
    }

    fn decode(&self, addr: Address) -> DecodedAddress {
        decode_address(addr, self.config.address_mapping_policy, self.banks.len() as u64, self.config.rows, self.config.columns)
    }

    pub fn enqueue(&mut self, mut request: CacheRequest) {
        let decoded = self.decode(request.address);
        request.memory_layout = Some(crate::event::MemoryLayout {
            controller: self.id.index() as u16,
            rank: decoded.rank,
            bank: decoded.bank,
            row: decoded.row,
            column: decoded.column,
        });
        match request.kind {
            CacheRequestKind::Load | CacheRequestKind::Fetch => self.stats.reads += 1,
            CacheRequestKind::Store => self.stats.writes += 1,
            CacheRequestKind::Writeback => self.stats.writebacks += 1,
        }
        self.access_scheduler.push(MemoryBankId(decoded.bank as usize), request);
        self.running = true;
    }

    /// One controller cycle: pick a ready bank's head command, check
    /// timing, issue at most one command (spec.md §4.4: "issues at most one
    /// command per cycle"). Returns `true` if it should be rescheduled next
    /// cycle (spec.md §9 "running flag").
    pub fn controller_cycle(&mut self, now: Cycle, downstream: &mut dyn ControllerDownstream) -> bool {
        let Some((bank_id, request)) = self.access_scheduler.peek_next_ready() else {
            self.running = false;
            return false;
        };

        let decoded = request
            .memory_layout
            .expect("requests are decoded before entering the access scheduler");
        let bank = &self.banks[bank_id.index()];
        let command = next_command_for_request(bank, &request, decoded.row, decoded.column);

        let last_activate_group = self.last_activate_by_group.get(&bank.bank_group).copied();
        let last_rw_group = self.last_rw_by_group.get(&bank.bank_group).copied();

        if check_timing(bank, command.kind, now, &self.config.timing, last_activate_group, last_rw_group).is_some() {
            self.stats.commands_deferred_for_timing += 1;
            let _ = self.command_policy;
            return true;
        }

        self.access_scheduler.pop(bank_id);
        let bank = &mut self.banks[bank_id.index()];
        bank.apply(command.kind, now, command.value);
        self.stats.commands_issued += 1;

        match command.kind {
            CommandKind::Activate => self.last_activate_by_group.insert(bank.bank_group, now),
            CommandKind::Read | CommandKind::Write => self.last_rw_by_group.insert(bank.bank_group, now),
            CommandKind::Precharge => None,
        };

        if command.completes_request {
            let request = command.associated_request.expect("RD/WR commands carry their request");
            let is_store = matches!(request.kind, CacheRequestKind::Store);
            let mut ack = request.clone();
            ack.serviced = true;
            downstream.ack(ack, now + self.config.data_latency);
            self.stats.acks_sent += 1;
            if is_store {
                downstream.refill_read(request, now + self.config.data_latency);
            }
        }

        true
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Per-bank DRAM command counters (spec.md §4.4), for the run report.
    pub fn dram_stats(&self) -> impl Iterator<Item = &stats::dram::Dram> {
        self.banks.iter().map(|bank| &bank.stats)
    }
}
