// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking queues and signals.
//!
//! These are the only shared mutable state in the system: each worker owns
//! one inbound and one outbound queue plus a stop and a wake signal, and
//! everything else stays private to the worker's thread.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct QueueState<T> {
    items: VecDeque<T>,
    unfinished: usize,
}

/// Unbounded FIFO queue with unfinished-task accounting.
///
/// `push` increments the unfinished count; consumers call [`EventQueue::task_done`]
/// once the popped item has been fully handled. [`EventQueue::wait_drained`]
/// blocks until the count reaches zero, which is how tests observe that a
/// worker has caught up with everything sent to it.
pub struct EventQueue<T> {
    state: Mutex<QueueState<T>>,
    items_available: Condvar,
    all_tasks_done: Condvar,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                unfinished: 0,
            }),
            items_available: Condvar::new(),
            all_tasks_done: Condvar::new(),
        }
    }

    /// Append an item. Never blocks.
    pub fn push(&self, item: T) {
        let mut state = self.state.lock();
        state.items.push_back(item);
        state.unfinished += 1;
        self.items_available.notify_one();
    }

    /// Non-blocking pop. The unfinished count stays up until `task_done`.
    pub fn try_pop(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Pop, waiting up to `timeout` for an item to arrive.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if self
                .items_available
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.items.pop_front();
            }
        }
    }

    /// Mark one previously popped item as fully handled.
    pub fn task_done(&self) {
        let mut state = self.state.lock();
        state.unfinished = state.unfinished.saturating_sub(1);
        if state.unfinished == 0 {
            self.all_tasks_done.notify_all();
        }
    }

    /// Block until the unfinished count reaches zero or `timeout` elapses.
    ///
    /// Returns true immediately when the queue drained before the wait
    /// started; the caller cannot otherwise distinguish that race from a
    /// missed notification.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.unfinished != 0 {
            if self
                .all_tasks_done
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }
        state.unfinished == 0
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct SignalInner {
    flag: Mutex<bool>,
    changed: Condvar,
}

/// A settable, waitable boolean flag. Clones share the same flag.
///
/// Stop signals are monotonic by convention (set once, never cleared); wake
/// signals are cleared by the worker after each observed wake-up.
#[derive(Clone)]
pub struct Signal {
    inner: Arc<SignalInner>,
}

impl Signal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                flag: Mutex::new(false),
                changed: Condvar::new(),
            }),
        }
    }

    pub fn set(&self) {
        let mut flag = self.inner.flag.lock();
        *flag = true;
        self.inner.changed.notify_all();
    }

    pub fn clear(&self) {
        *self.inner.flag.lock() = false;
    }

    pub fn is_set(&self) -> bool {
        *self.inner.flag.lock()
    }

    /// Wait until the signal is set or `timeout` elapses; returns whether it
    /// ended up set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut flag = self.inner.flag.lock();
        while !*flag {
            if self.inner.changed.wait_until(&mut flag, deadline).timed_out() {
                break;
            }
        }
        *flag
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
