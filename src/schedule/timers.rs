use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
};

use crate::foundation::core::TimeMs;

/// Cancellation handle for one scheduled task. Tokens are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(u64);

/// Deferred callbacks on a single-threaded virtual clock.
///
/// Due tasks come out ordered by due time, then by scheduling order, so two
/// tasks due at the same instant run in the order they were scheduled.
/// Cancellation is lazy: the heap entry stays but its payload is gone.
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<(TimeMs, u64)>>,
    live: HashMap<u64, T>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: TimeMs, task: T) -> TimerToken {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((due, seq)));
        self.live.insert(seq, task);
        TimerToken(seq)
    }

    /// Returns the task if it was still pending.
    pub fn cancel(&mut self, token: TimerToken) -> Option<T> {
        self.live.remove(&token.0)
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.live.contains_key(&token.0)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Earliest due time among pending tasks.
    pub fn next_due(&mut self) -> Option<TimeMs> {
        self.discard_cancelled_head();
        self.heap.peek().map(|Reverse((due, _))| *due)
    }

    /// Pops the earliest pending task due at or before `now`.
    pub fn pop_due(&mut self, now: TimeMs) -> Option<(TimeMs, TimerToken, T)> {
        self.discard_cancelled_head();
        let Reverse((due, seq)) = *self.heap.peek()?;
        if due > now {
            return None;
        }
        self.heap.pop();
        let task = self.live.remove(&seq)?;
        Some((due, TimerToken(seq), task))
    }

    /// Drops every pending task.
    pub fn clear(&mut self) -> usize {
        let n = self.live.len();
        self.live.clear();
        self.heap.clear();
        n
    }

    fn discard_cancelled_head(&mut self) {
        while let Some(Reverse((_, seq))) = self.heap.peek() {
            if self.live.contains_key(seq) {
                break;
            }
            self.heap.pop();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/timers.rs"]
mod tests;
