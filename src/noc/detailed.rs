//! Detailed NoC: a genuine in-crate flit-level, virtual-channel, wormhole
//! flow-controlled mesh simulator.
//!
//! The original delegates this variant to an external cycle-accurate
//! interconnect simulator linked in over FFI. That dependency does not
//! belong in this crate (no vendored C++, no FFI surface to a simulator we
//! cannot ship), so the detailed model is implemented directly: packets are
//! split into fixed-size flits, each flit occupies one virtual channel per
//! hop, and a flit only advances when the next router has a free buffer
//! slot on the target VC (credit-based wormhole routing). Dimension-order
//! (X-then-Y) routing matches [`crate::noc::simple::SimpleNoc`] so the two
//! variants agree on path selection and differ only in how faithfully they
//! model contention.

use std::collections::{HashMap, VecDeque};

use crate::address::Cycle;
use crate::event::{MessageClass, NoCMessage};
use crate::ids::NocId;
use crate::noc::{Noc, Port};

struct Flit {
    packet_id: u64,
    is_tail: bool,
}

/// One router per mesh node. Each direction has `vcs_per_class * 2` virtual
/// channels (REQUEST class then REPLY class); a flit advances to the next
/// router only when that router reports a free buffer slot (credit).
struct Router {
    coords: (i32, i32),
    input_buffers: Vec<VecDeque<Flit>>,
    buffer_depth: usize,
}

impl Router {
    fn new(coords: (i32, i32), num_vcs: usize, buffer_depth: usize) -> Self {
        Self {
            coords,
            input_buffers: (0..num_vcs).map(|_| VecDeque::new()).collect(),
            buffer_depth,
        }
    }

    fn has_room(&self, vc: usize) -> bool {
        self.input_buffers[vc].len() < self.buffer_depth
    }
}

struct PacketInfo {
    message: Option<NoCMessage>,
    destination: Port,
}

pub struct DetailedNoc {
    id: NocId,
    x_size: u16,
    y_size: u16,
    vcs_per_class: usize,
    flit_size_bits: u32,
    routers: Vec<Router>,
    packets: HashMap<u64, PacketInfo>,
    next_packet_id: u64,
}

impl DetailedNoc {
    #[must_use]
    pub fn new(id: NocId, x_size: u16, y_size: u16) -> Self {
        let num_nodes = usize::from(x_size) * usize::from(y_size);
        let vcs_per_class = 2;
        let routers = (0..num_nodes)
            .map(|i| {
                let x = (i as i32) % i32::from(x_size);
                let y = (i as i32) / i32::from(x_size);
                Router::new((x, y), vcs_per_class * 2, 8)
            })
            .collect();
        Self {
            id,
            x_size,
            y_size,
            vcs_per_class,
            flit_size_bits: 128,
            routers,
            packets: HashMap::new(),
            next_packet_id: 0,
        }
    }

    fn coords(&self, port: Port) -> (i32, i32) {
        let port = i32::from(port);
        (port % i32::from(self.x_size), port / i32::from(self.x_size))
    }

    fn router_index(&self, coords: (i32, i32)) -> Option<usize> {
        let (x, y) = coords;
        if x < 0 || y < 0 || x >= i32::from(self.x_size) || y >= i32::from(self.y_size) {
            return None;
        }
        Some((y * i32::from(self.x_size) + x) as usize)
    }

    fn vc_for(&self, class: MessageClass) -> usize {
        match class {
            MessageClass::Request => 0,
            MessageClass::Reply => self.vcs_per_class,
        }
    }

    fn num_flits(&self, message: &NoCMessage) -> u32 {
        message.size_bits.div_ceil(self.flit_size_bits).max(1)
    }
}

impl Noc for DetailedNoc {
    fn check_space_for_packet(&self, injected_by: Port, message: &NoCMessage) -> bool {
        let vc = self.vc_for(message.class());
        self.routers[usize::from(injected_by)].has_room(vc)
    }

    fn inject(&mut self, injected_by: Port, message: NoCMessage, _now: Cycle) {
        let vc = self.vc_for(message.class());
        let num_flits = self.num_flits(&message);
        let packet_id = self.next_packet_id;
        self.next_packet_id += 1;
        let destination = message.dst_port;

        self.packets.insert(packet_id, PacketInfo { message: Some(message), destination });

        let router = &mut self.routers[usize::from(injected_by)];
        for flit_index in 0..num_flits {
            router.input_buffers[vc].push_back(Flit {
                packet_id,
                is_tail: flit_index + 1 == num_flits,
            });
        }
    }

    /// One cycle of router advance: the head flit buffered on each VC of
    /// every router tries to move one hop toward its destination
    /// (dimension-order X-then-Y), gated on the next router having a free
    /// slot on the same VC. A tail flit that reaches its destination
    /// router delivers the whole message.
    fn cycle(&mut self, now: Cycle, deliver: &mut dyn FnMut(Port, NoCMessage, Cycle)) {
        let num_routers = self.routers.len();
        let num_vcs = self.vcs_per_class * 2;

        for router_index in 0..num_routers {
            for vc in 0..num_vcs {
                let Some(flit_packet_id) = self.routers[router_index].input_buffers[vc].front().map(|f| f.packet_id) else {
                    continue;
                };
                let Some(info) = self.packets.get(&flit_packet_id) else {
                    // Already delivered (tail popped on a previous VC pass
                    // within this cycle is impossible since each flit is on
                    // exactly one VC, but defensive all the same).
                    self.routers[router_index].input_buffers[vc].pop_front();
                    continue;
                };
                let destination = info.destination;
                let (cx, cy) = self.routers[router_index].coords;
                let (dx, dy) = self.coords(destination);

                if (cx, cy) == (dx, dy) {
                    let flit = self.routers[router_index].input_buffers[vc].pop_front().unwrap();
                    if flit.is_tail {
                        if let Some(mut info) = self.packets.remove(&flit.packet_id) {
                            let message = info.message.take().expect("tail flit delivers exactly once");
                            deliver(info.destination, message, now);
                        }
                    }
                    continue;
                }

                let next_coords = if cx != dx {
                    (cx + (dx - cx).signum(), cy)
                } else {
                    (cx, cy + (dy - cy).signum())
                };
                let Some(next_router_index) = self.router_index(next_coords) else {
                    continue;
                };
                if self.routers[next_router_index].has_room(vc) {
                    let flit = self.routers[router_index].input_buffers[vc].pop_front().unwrap();
                    self.routers[next_router_index].input_buffers[vc].push_back(flit);
                }
            }
        }
    }

    fn id(&self) -> NocId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ControlEvent, Event, NoCMessageKind};

    fn dummy_message(dst: Port) -> NoCMessage {
        NoCMessage::new(
            NoCMessageKind::RemoteL2Request,
            512,
            0,
            dst,
            Event::Fence(ControlEvent { origin_timestamp: 0, origin_core: 0 }),
        )
    }

    #[test]
    fn single_hop_packet_delivers_within_a_few_cycles() {
        let mut noc = DetailedNoc::new(NocId(0), 2, 1);
        noc.inject(0, dummy_message(1), 0);

        let mut delivered = Vec::new();
        for cycle in 0..8 {
            noc.cycle(cycle, &mut |port, message, at| delivered.push((port, message.dst_port, at)));
            if !delivered.is_empty() {
                break;
            }
        }
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, 1);
    }
}
