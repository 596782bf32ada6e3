//! Explicit timer queue.
//!
//! Every timer belongs to exactly one entity (cached record, publish set,
//! query). The owner keeps the [`TimerId`] and cancels it when it goes away,
//! so a task popped from the queue always refers to a live entity.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

pub struct Scheduler<T> {
    queue: BTreeMap<(Instant, TimerId), T>,
    deadlines: FxHashMap<TimerId, Instant>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            deadlines: FxHashMap::default(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, deadline: Instant, task: T) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.queue.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        id
    }

    pub fn schedule_in(&mut self, now: Instant, delay: Duration, task: T) -> TimerId {
        self.schedule(now + delay, task)
    }

    /// Removes a pending timer. Cancelling a timer that already fired is a
    /// no-op.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id)?;
        self.queue.remove(&(deadline, id))
    }

    pub fn deadline(&self, id: TimerId) -> Option<Instant> {
        self.deadlines.get(&id).copied()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pops the earliest timer due at `now`, if any.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, T)> {
        let (&(deadline, id), _) = self.queue.iter().next()?;
        if deadline > now {
            return None;
        }
        self.deadlines.remove(&id);
        self.queue.remove(&(deadline, id)).map(|task| (id, task))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
