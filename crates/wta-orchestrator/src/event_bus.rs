//! Multi-producer event queue feeding the plan scheduler.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use wta_core::events::Event;

/// Unbounded FIFO of domain events.
///
/// Producers hold the lock only long enough to push. Consumers may poll,
/// block, block with a deadline, or take a batch.
#[derive(Default)]
pub struct EventBus {
    queue: Mutex<VecDeque<Event>>,
    ready: Condvar,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: Event) {
        self.queue.lock().push_back(event);
        self.ready.notify_one();
    }

    pub fn try_pop(&self) -> Option<Event> {
        self.queue.lock().pop_front()
    }

    /// Block until an event is available.
    pub fn wait_and_pop(&self) -> Event {
        let mut queue = self.queue.lock();
        loop {
            if let Some(event) = queue.pop_front() {
                return event;
            }
            self.ready.wait(&mut queue);
        }
    }

    /// Block for at most `timeout`.
    pub fn wait_and_pop_timeout(&self, timeout: Duration) -> Option<Event> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.queue.lock();
        loop {
            if let Some(event) = queue.pop_front() {
                return Some(event);
            }
            if self.ready.wait_until(&mut queue, deadline).timed_out() {
                return queue.pop_front();
            }
        }
    }

    /// Take up to `max` events, oldest first, without blocking.
    pub fn drain(&self, max: usize) -> Vec<Event> {
        let mut queue = self.queue.lock();
        let n = max.min(queue.len());
        queue.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
