//! Per-tile arbiter (spec.md §4.3): a queueing multiplexer between local
//! input classes and NoC injection, selecting round-robin among non-empty
//! inputs and forwarding one message per cycle if the NoC can accept it.

use crate::error::ConfigError;
use crate::event::NoCMessage;
use crate::fifo::Fifo;
use crate::ids::{ArbiterId, TileId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InputClass {
    LocalCore,
    LocalBank(usize),
}

struct Input {
    class: InputClass,
    queue: Fifo<NoCMessage>,
}

/// Bound exactly once per (tile, class) (spec.md §9 "Open question /
/// possible source bug": treat a second bind as a configuration error).
pub struct Arbiter {
    pub id: ArbiterId,
    pub tile: TileId,
    inputs: Vec<Input>,
    rr_cursor: usize,
    pub stats_grants: u64,
    pub stats_stalls: u64,
}

impl Arbiter {
    #[must_use]
    pub fn new(id: ArbiterId, tile: TileId) -> Self {
        Self {
            id,
            tile,
            inputs: Vec::new(),
            rr_cursor: 0,
            stats_grants: 0,
            stats_stalls: 0,
        }
    }

    pub fn bind_input(&mut self, class: InputClass, capacity: Option<usize>) -> Result<(), ConfigError> {
        if self.inputs.iter().any(|input| input.class == class) {
            return Err(ConfigError::DuplicateArbiterBinding {
                tile: self.tile.index(),
                class: format!("{class:?}"),
            });
        }
        self.inputs.push(Input {
            class,
            queue: Fifo::new(format!("arbiter-{}-{:?}", self.id.index(), class), capacity),
        });
        Ok(())
    }

    pub fn submit(&mut self, class: InputClass, message: NoCMessage) -> Result<(), NoCMessage> {
        let input = self
            .inputs
            .iter_mut()
            .find(|input| input.class == class)
            .expect("submit to an unbound input class");
        input.queue.try_push(message)
    }

    /// Selects round-robin among non-empty inputs and, if `can_accept`
    /// reports room in the NoC, pops and returns the chosen message. Only
    /// ever returns one message per call (spec.md §4.3 "forwards one per
    /// cycle").
    pub fn arbitrate(&mut self, can_accept: impl FnOnce(&NoCMessage) -> bool) -> Option<NoCMessage> {
        let n = self.inputs.len();
        if n == 0 {
            return None;
        }
        for offset in 0..n {
            let index = (self.rr_cursor + offset) % n;
            if let Some(message) = self.inputs[index].queue.peek() {
                if can_accept(message) {
                    self.rr_cursor = (index + 1) % n;
                    self.stats_grants += 1;
                    return self.inputs[index].queue.pop();
                }
                self.stats_stalls += 1;
                return None;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_bind_to_same_class_is_a_config_error() {
        let mut arbiter = Arbiter::new(ArbiterId(0), TileId(0));
        arbiter.bind_input(InputClass::LocalCore, None).unwrap();
        let err = arbiter.bind_input(InputClass::LocalCore, None).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateArbiterBinding { .. }));
    }
}
