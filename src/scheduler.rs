//! Discrete-event scheduler (spec.md §4.1, §5): every component schedules
//! future work by enqueueing a callback at `now + delta`; callbacks
//! scheduled for the same cycle fire in deterministic phase order (`Tick`
//! before `PostTick`) and, within a phase, in registration order. No
//! callback may block or yield — it runs to completion and returns.
//!
//! Every arena field in [`crate::world::World`] is a `RefCell` (spec.md §5
//! divergence note: the teacher's `Arc<Mutex<T>>` exists to support a
//! parallel-simulation mode Coyote doesn't have; single-threaded
//! cooperative scheduling needs only interior mutability, not locking).
//! That lets a callback take a shared `&World` and still mutate whatever
//! component it targets, which in turn lets the queue itself live behind a
//! `RefCell` inside `World` instead of fighting the borrow checker over
//! "the callback needs both the arena and the queue that invoked it."

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::address::Cycle;
use crate::world::World;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Tick,
    PostTick,
}

pub type Callback = Box<dyn FnOnce(&World)>;

struct ScheduledCallback {
    cycle: Cycle,
    phase: Phase,
    sequence: u64,
    callback: Callback,
}

impl PartialEq for ScheduledCallback {
    fn eq(&self, other: &Self) -> bool {
        self.cycle == other.cycle && self.phase == other.phase && self.sequence == other.sequence
    }
}
impl Eq for ScheduledCallback {}

impl Ord for ScheduledCallback {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest (cycle, phase,
        // sequence) pops first.
        (other.cycle, other.phase, other.sequence).cmp(&(self.cycle, self.phase, self.sequence))
    }
}
impl PartialOrd for ScheduledCallback {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
pub struct Scheduler {
    now: Cycle,
    queue: BinaryHeap<ScheduledCallback>,
    next_sequence: u64,
    finished_cores: HashSet<u16>,
    num_cores: u16,
}

impl Scheduler {
    #[must_use]
    pub fn new(num_cores: u16) -> Self {
        Self {
            now: 0,
            queue: BinaryHeap::new(),
            next_sequence: 0,
            finished_cores: HashSet::new(),
            num_cores,
        }
    }

    #[must_use]
    pub fn now(&self) -> Cycle {
        self.now
    }

    pub fn schedule<F>(&mut self, delta: Cycle, phase: Phase, callback: F)
    where
        F: FnOnce(&World) + 'static,
    {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push(ScheduledCallback {
            cycle: self.now + delta,
            phase,
            sequence,
            callback: Box::new(callback),
        });
    }

    pub fn mark_finished(&mut self, core: u16) {
        self.finished_cores.insert(core);
    }

    #[must_use]
    pub fn all_cores_finished(&self) -> bool {
        self.num_cores > 0 && self.finished_cores.len() >= self.num_cores as usize
    }

    #[must_use]
    pub fn finished_core_count(&self) -> usize {
        self.finished_cores.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pops every callback due at the earliest pending cycle, in
    /// phase-then-registration order. Returns `None` once the queue is
    /// empty.
    fn drain_next_cycle(&mut self) -> Option<Vec<Callback>> {
        let next_cycle = self.queue.peek()?.cycle;
        self.now = next_cycle;
        let mut batch = Vec::new();
        while let Some(top) = self.queue.peek() {
            if top.cycle != self.now {
                break;
            }
            batch.push(self.queue.pop().unwrap().callback);
        }
        Some(batch)
    }
}

impl World {
    /// Runs until every core has reported `Finish` or the callback queue is
    /// empty, whichever comes first (spec.md §6 "Exit / reports").
    pub fn run(&self) {
        loop {
            if self.scheduler().borrow().all_cores_finished() {
                break;
            }
            let Some(batch) = self.scheduler().borrow_mut().drain_next_cycle() else {
                break;
            };
            for callback in batch {
                callback(self);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn callbacks_fire_in_phase_then_registration_order() {
        let world = World::new_empty(1);
        let trace = Rc::new(RefCell::new(Vec::new()));

        let t1 = trace.clone();
        world.scheduler().borrow_mut().schedule(1, Phase::PostTick, move |_| t1.borrow_mut().push("post-a"));
        let t2 = trace.clone();
        world.scheduler().borrow_mut().schedule(1, Phase::Tick, move |_| t2.borrow_mut().push("tick-a"));
        let t3 = trace.clone();
        world.scheduler().borrow_mut().schedule(1, Phase::Tick, move |_| t3.borrow_mut().push("tick-b"));
        world
            .scheduler()
            .borrow_mut()
            .schedule(2, Phase::Tick, |world: &World| world.scheduler().borrow_mut().mark_finished(0));

        world.run();

        assert_eq!(*trace.borrow(), vec!["tick-a", "tick-b", "post-a"]);
    }
}
