// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle harness.
//!
//! Every member of the fleet is a [`Worker`]: it can be started once,
//! stopped cooperatively, and exposes an outbound queue for its monitor
//! thread. [`ThreadWorker`] is the threaded harness most workers build on;
//! it owns the OS thread, the queues, and the stop/wake signals, and leaves
//! the body of the work to a [`Task`].

use crate::queue::{EventQueue, Signal};
use cas_core::{EventKind, WorkerEvent};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker thread did not become quiescent within the stop timeout.
    /// Raised only after teardown bookkeeping has run.
    #[error("worker did not stop within {0:?}")]
    StopTimeout(Duration),
    /// Failed to spawn the worker's thread. The only fatal startup error.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(io::Error),
    /// Filesystem observer failure.
    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Cloneable handle that enqueues into a worker's inbound queue and raises
/// its wake signal. Enqueueing never blocks.
pub struct Sender<E> {
    inbound: Arc<EventQueue<E>>,
    wake: Signal,
}

impl<E> Clone for Sender<E> {
    fn clone(&self) -> Self {
        Self {
            inbound: Arc::clone(&self.inbound),
            wake: self.wake.clone(),
        }
    }
}

impl<E> Sender<E> {
    pub fn send(&self, message: E) {
        self.inbound.push(message);
        self.wake.set();
    }
}

pub type EventSender = Sender<WorkerEvent>;

/// An event worker's consumed-variant declaration, captured at registration.
pub struct Subscription {
    pub consumes: &'static [EventKind],
    pub sender: EventSender,
}

/// Common supertype of every worker in the fleet.
pub trait Worker: Send {
    fn name(&self) -> &str;

    /// Idempotent. Starting an already-started worker is a no-op.
    fn start(&mut self) -> Result<(), WorkerError>;

    /// Idempotent. Sets the stop signal, raises the wake signal, and waits
    /// up to `timeout` for quiescence. Stopping an unstarted worker is a
    /// no-op; a worker stopping itself signals without joining.
    fn stop(&mut self, timeout: Option<Duration>) -> Result<(), WorkerError>;

    /// Receive-only handle for the monitor thread.
    fn outbound(&self) -> Arc<EventQueue<WorkerEvent>>;

    /// Consumed-event declaration; `None` for workers that only produce.
    fn subscription(&self) -> Option<Subscription> {
        None
    }
}

/// Execution context handed to a worker's task. Cloning shares the same
/// queues and signals.
pub struct TaskContext<E = WorkerEvent> {
    name: Arc<str>,
    pub(crate) stop: Signal,
    pub(crate) wake: Signal,
    pub(crate) inbound: Arc<EventQueue<E>>,
    outbound: Arc<EventQueue<WorkerEvent>>,
}

impl<E> Clone for TaskContext<E> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            stop: self.stop.clone(),
            wake: self.wake.clone(),
            inbound: Arc::clone(&self.inbound),
            outbound: Arc::clone(&self.outbound),
        }
    }
}

impl<E> TaskContext<E> {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            stop: Signal::new(),
            wake: Signal::new(),
            inbound: Arc::new(EventQueue::new()),
            outbound: Arc::new(EventQueue::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue an event for the monitor thread to forward into the loop.
    pub fn emit(&self, event: WorkerEvent) {
        self.outbound.push(event);
    }

    pub fn should_stop(&self) -> bool {
        self.stop.is_set()
    }

    /// Interruptible sleep: returns true when stop was signalled.
    pub fn wait_for_stop(&self, timeout: Duration) -> bool {
        self.stop.wait_timeout(timeout)
    }

    pub(crate) fn sender(&self) -> Sender<E> {
        Sender {
            inbound: Arc::clone(&self.inbound),
            wake: self.wake.clone(),
        }
    }

    pub(crate) fn stop_signal(&self) -> Signal {
        self.stop.clone()
    }

    pub(crate) fn wake_signal(&self) -> Signal {
        self.wake.clone()
    }

    pub(crate) fn outbound_queue(&self) -> Arc<EventQueue<WorkerEvent>> {
        Arc::clone(&self.outbound)
    }
}

/// A worker body run on its own thread.
pub trait Task: Send + 'static {
    type Message: Send + 'static;

    fn run(&mut self, ctx: &TaskContext<Self::Message>);
}

/// Threaded harness: one named OS thread driving a [`Task`].
pub struct ThreadWorker<T: Task> {
    name: String,
    ctx: TaskContext<T::Message>,
    task: Option<T>,
    thread: Option<JoinHandle<()>>,
    finished: Signal,
}

impl<T: Task> ThreadWorker<T> {
    pub fn new(name: impl Into<String>, task: T) -> Self {
        let name = name.into();
        let ctx = TaskContext::new(&name);
        Self::from_parts(name, ctx, task)
    }

    pub(crate) fn from_parts(name: String, ctx: TaskContext<T::Message>, task: T) -> Self {
        Self {
            name,
            ctx,
            task: Some(task),
            thread: None,
            finished: Signal::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_alive(&self) -> bool {
        self.thread.is_some() && !self.finished.is_set()
    }

    pub fn outbound(&self) -> Arc<EventQueue<WorkerEvent>> {
        self.ctx.outbound_queue()
    }

    /// Enqueue a message and wake the worker.
    pub fn send(&self, message: T::Message) {
        self.ctx.sender().send(message);
    }

    pub(crate) fn sender(&self) -> Sender<T::Message> {
        self.ctx.sender()
    }

    /// Test hook: block until every queued inbound message has been handled.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        self.ctx.inbound.wait_drained(timeout)
    }

    pub fn start(&mut self) -> Result<(), WorkerError> {
        if self.thread.is_some() {
            return Ok(());
        }
        // A worker that already ran to completion has no task left to run.
        let Some(mut task) = self.task.take() else {
            return Ok(());
        };

        let ctx = self.ctx.clone();
        let finished = self.finished.clone();
        let handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                task.run(&ctx);
                finished.set();
            })
            .map_err(WorkerError::Spawn)?;
        self.thread = Some(handle);
        Ok(())
    }

    pub fn stop(&mut self, timeout: Option<Duration>) -> Result<(), WorkerError> {
        let Some(handle) = self.thread.take() else {
            return Ok(());
        };

        self.ctx.stop.set();
        self.ctx.wake.set();

        // A worker stopping itself only signals; joining here would deadlock.
        if handle.thread().id() == thread::current().id() {
            return Ok(());
        }

        match timeout {
            Some(duration) if !self.finished.wait_timeout(duration) => {
                Err(WorkerError::StopTimeout(duration))
            }
            _ => {
                let _ = handle.join();
                Ok(())
            }
        }
    }
}

impl<T> Worker for ThreadWorker<T>
where
    T: Task<Message = WorkerEvent>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        ThreadWorker::start(self)
    }

    fn stop(&mut self, timeout: Option<Duration>) -> Result<(), WorkerError> {
        ThreadWorker::stop(self, timeout)
    }

    fn outbound(&self) -> Arc<EventQueue<WorkerEvent>> {
        self.ctx.outbound_queue()
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
