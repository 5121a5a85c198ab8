//! Bounded blocking single-consumer event queue.
//!
//! A fixed-capacity FIFO ring guarded by a mutex and two condvars: one
//! signaled when the ring becomes non-empty, one when it becomes non-full.
//! Grounded in `event_queue.c`'s pthread-mutex-and-condvar design, kept
//! over a lock-free ring since downstream SQL latency dominates any
//! contention here.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::core::error::QueueError;
use crate::event::Event;
use crate::metrics::Metrics;

struct State {
    ring: VecDeque<Event>,
    capacity: usize,
    closed: bool,
}

/// Outcome of a non-blocking or closed-and-drained pop.
pub enum PopResult {
    Item(Event),
    Empty,
    Closed,
}

pub struct EventQueue {
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
    metrics: &'static Metrics,
}

impl EventQueue {
    pub fn new(capacity: usize, metrics: &'static Metrics) -> Self {
        Self {
            state: Mutex::new(State {
                ring: VecDeque::with_capacity(capacity),
                capacity,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            metrics,
        }
    }

    /// Blocks while the queue is full and open. Returns `false` iff the
    /// queue is closed (the event is not enqueued in that case).
    pub fn push(&self, event: Event) -> bool {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.closed {
                return false;
            }
            if state.ring.len() < state.capacity {
                state.ring.push_back(event);
                let size = state.ring.len();
                drop(state);
                self.not_empty.notify_one();
                self.metrics.inc_queue_pushes();
                self.metrics.update_queue_high_water(size as u64);
                return true;
            }
            state = self.not_full.wait(state).unwrap();
        }
    }

    /// Typed-error wrapper over [`push`](Self::push), for callers in the
    /// §7 error-handling design that want a `Result` rather than a bare
    /// `bool` for the "queue closed on push" case.
    pub fn push_checked(&self, event: Event) -> Result<(), QueueError> {
        if self.push(event) {
            Ok(())
        } else {
            Err(QueueError::Closed)
        }
    }

    /// Blocking pop: waits for an item or for the queue to close and drain.
    pub fn pop_blocking(&self) -> PopResult {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(event) = state.ring.pop_front() {
                drop(state);
                self.not_full.notify_one();
                self.metrics.inc_queue_pops();
                return PopResult::Item(event);
            }
            if state.closed {
                return PopResult::Closed;
            }
            state = self.not_empty.wait(state).unwrap();
        }
    }

    /// Non-blocking pop: returns immediately if the ring is empty.
    pub fn pop_nonblocking(&self) -> PopResult {
        let mut state = self.state.lock().unwrap();
        if let Some(event) = state.ring.pop_front() {
            drop(state);
            self.not_full.notify_one();
            self.metrics.inc_queue_pops();
            return PopResult::Item(event);
        }
        if state.closed {
            PopResult::Closed
        } else {
            PopResult::Empty
        }
    }

    /// Idempotent. Wakes all waiters; subsequent pushes fail; pops continue
    /// draining remaining items, then report closed.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn size(&self) -> usize {
        self.state.lock().unwrap().ring.len()
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().unwrap().capacity
    }
}

/// Convenience helper used by the writer's poll loop: tiny sleep applied
/// after an empty non-blocking pop to avoid busy-waiting.
pub const EMPTY_POLL_BACKOFF: Duration = Duration::from_millis(1);
