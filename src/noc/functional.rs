//! Functional NoC (spec.md §4.6): every message arrives after a fixed
//! `packet_latency`, with unbounded per-destination queues. The simplest of
//! the three variants — used for correctness runs where interconnect
//! contention is not the thing under study.

use std::collections::VecDeque;

use crate::address::Cycle;
use crate::event::NoCMessage;
use crate::ids::NocId;
use crate::noc::{Noc, Port};

struct InFlight {
    message: NoCMessage,
    destination: Port,
    arrival: Cycle,
}

pub struct FunctionalNoc {
    id: NocId,
    packet_latency: Cycle,
    in_flight: VecDeque<InFlight>,
}

impl FunctionalNoc {
    #[must_use]
    pub fn new(id: NocId, packet_latency: Cycle) -> Self {
        Self { id, packet_latency, in_flight: VecDeque::new() }
    }
}

impl Noc for FunctionalNoc {
    fn check_space_for_packet(&self, _injected_by: Port, _message: &NoCMessage) -> bool {
        true
    }

    fn inject(&mut self, injected_by: Port, message: NoCMessage, now: Cycle) {
        let destination = message.dst_port;
        let _ = injected_by;
        self.in_flight.push_back(InFlight {
            message,
            destination,
            arrival: now + self.packet_latency,
        });
    }

    fn cycle(&mut self, now: Cycle, deliver: &mut dyn FnMut(Port, NoCMessage, Cycle)) {
        while let Some(front) = self.in_flight.front() {
            if front.arrival != now {
                break;
            }
            let in_flight = self.in_flight.pop_front().unwrap();
            deliver(in_flight.destination, in_flight.message, now);
        }
    }

    fn id(&self) -> NocId {
        self.id
    }
}
