//! Event trace (spec.md §6 "Trace file format"): one CSV row per recorded
//! event, `timestamp,core,pc,event_type,id,address`. Grounded on the
//! teacher's use of the `csv` crate for its own report writers.

use std::io::Write;

use serde::Serialize;

use crate::address::{Address, Cycle};

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StallReason {
    FetchMiss,
    Raw,
    Mshrs,
    WaitingOnBarrier,
    CoreFinished,
    VectorWaitingOnScalarStore,
}

#[derive(Clone, Debug, Serialize)]
pub struct TraceRecord {
    pub timestamp: Cycle,
    pub core: u16,
    pub pc: u64,
    pub event_type: String,
    pub id: String,
    pub address: String,
}

impl TraceRecord {
    #[must_use]
    pub fn new(timestamp: Cycle, core: u16, pc: u64, event_type: impl Into<String>, id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            timestamp,
            core,
            pc,
            event_type: event_type.into(),
            id: id.into(),
            address: address.into(),
        }
    }

    #[must_use]
    pub fn hex(addr: Address) -> String {
        format!("{addr:#x}")
    }
}

/// A `(lower_bound, upper_bound)` cycle filter plus an events-of-interest
/// whitelist; empty whitelist means every kind is emitted (spec.md §6).
#[derive(Clone, Debug, Default)]
pub struct TraceFilter {
    pub lower_bound: Option<Cycle>,
    pub upper_bound: Option<Cycle>,
    pub events_of_interest: Vec<String>,
}

impl TraceFilter {
    #[must_use]
    pub fn accepts(&self, record: &TraceRecord) -> bool {
        if let Some(lower) = self.lower_bound {
            if record.timestamp < lower {
                return false;
            }
        }
        if let Some(upper) = self.upper_bound {
            if record.timestamp > upper {
                return false;
            }
        }
        self.events_of_interest.is_empty() || self.events_of_interest.iter().any(|kind| kind == &record.event_type)
    }
}

pub trait TraceSink {
    fn record(&mut self, record: TraceRecord);
}

/// Writes accepted records straight to a CSV writer (spec.md §6).
pub struct CsvTraceSink<W: Write> {
    writer: csv::Writer<W>,
    filter: TraceFilter,
}

impl<W: Write> CsvTraceSink<W> {
    pub fn new(writer: W, filter: TraceFilter) -> std::io::Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_writer(writer),
            filter,
        })
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl<W: Write> TraceSink for CsvTraceSink<W> {
    fn record(&mut self, record: TraceRecord) {
        if !self.filter.accepts(&record) {
            return;
        }
        if let Err(error) = self.writer.serialize(&record) {
            log::warn!("failed to write trace record: {error}");
        }
    }
}

/// No-op sink used when `trace` is disabled (spec.md §6 `trace: bool`).
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn record(&mut self, _record: TraceRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_rejects_out_of_range_cycles() {
        let filter = TraceFilter { lower_bound: Some(10), upper_bound: Some(20), events_of_interest: vec![] };
        let record = TraceRecord::new(5, 0, 0, "l2_hit", "0", "0x0");
        assert!(!filter.accepts(&record));
    }

    #[test]
    fn empty_whitelist_accepts_every_kind() {
        let filter = TraceFilter::default();
        let record = TraceRecord::new(0, 0, 0, "stall", "0", "raw");
        assert!(filter.accepts(&record));
    }
}
