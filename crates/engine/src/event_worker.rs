// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative event-processing loop shared by every event worker.
//!
//! The termination condition is "stop signalled AND inbound empty": a
//! producer can queue a final batch, request a stop, and trust the worker to
//! drain what it already accepted before returning.

use crate::worker::{Subscription, Task, TaskContext, ThreadWorker, Worker, WorkerError};
use cas_core::{EventKind, WorkerEvent};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long the loop waits on the wake signal when inbound is empty. This
/// bounds how late a stop request can be observed.
const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Typed event consumption: implemented by each worker's handler and driven
/// by [`EventTask`].
pub trait EventHandler: Send + 'static {
    /// Inbound element type. Fleet workers consume [`WorkerEvent`]; the loop
    /// itself consumes routed envelopes.
    type Event: Send + 'static;
    type Error: std::error::Error;

    /// Event variants this worker consumes; drives subscription
    /// registration. Declared on the worker rather than discovered at
    /// runtime.
    const CONSUMES: &'static [EventKind];

    /// Handle one inbound event. Errors are logged at the harness boundary
    /// and never reach the loop's dispatch path.
    fn handle_event(
        &mut self,
        ctx: &TaskContext<Self::Event>,
        event: Self::Event,
    ) -> Result<(), Self::Error>;

    /// Called once before the first loop iteration.
    fn pre_run(&mut self, _ctx: &TaskContext<Self::Event>) {}

    /// Called once after the loop exits.
    fn post_run(&mut self, _ctx: &TaskContext<Self::Event>) {}

    /// Called every iteration before the inbound poll, event or not. The
    /// queue may become non-empty between this call and the poll.
    fn pre_event(&mut self, _ctx: &TaskContext<Self::Event>) {}

    /// Called after every iteration except a stop-and-no-event exit.
    fn post_event(&mut self, _ctx: &TaskContext<Self::Event>) {}

    /// Periodic callbacks, scanned once per loop iteration.
    fn periodics() -> Vec<Periodic<Self>>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

/// A periodic callback record. Owned by a single worker, never shared.
pub struct Periodic<H: EventHandler> {
    callback: fn(&mut H, &TaskContext<H::Event>),
    period: Duration,
    next_due: Option<Instant>,
}

impl<H: EventHandler> Periodic<H> {
    pub fn new(period: Duration, callback: fn(&mut H, &TaskContext<H::Event>)) -> Self {
        Self {
            callback,
            period,
            next_due: None,
        }
    }
}

/// Drives an [`EventHandler`] with the cooperative poll loop.
pub struct EventTask<H: EventHandler> {
    handler: H,
    periodics: Vec<Periodic<H>>,
}

impl<H: EventHandler> EventTask<H> {
    pub fn new(handler: H) -> Self {
        Self {
            periodics: H::periodics(),
            handler,
        }
    }
}

impl<H: EventHandler> Task for EventTask<H> {
    type Message = H::Event;

    fn run(&mut self, ctx: &TaskContext<H::Event>) {
        self.handler.pre_run(ctx);

        loop {
            if ctx.stop.is_set() && ctx.inbound.is_empty() {
                break;
            }

            // Don't block when events are already waiting. An event can land
            // between the emptiness check and the wait; the wake timeout
            // bounds that delay to a second.
            if ctx.inbound.is_empty() && ctx.wake.wait_timeout(WAKE_TIMEOUT) {
                ctx.wake.clear();
            }

            // Timed callbacks never run once stop has taken effect.
            if !ctx.stop.is_set() {
                let now = Instant::now();
                for periodic in &mut self.periodics {
                    if periodic.next_due.map_or(true, |due| due <= now) {
                        (periodic.callback)(&mut self.handler, ctx);
                        periodic.next_due = Some(now + periodic.period);
                    }
                }
            }

            self.handler.pre_event(ctx);

            // An event arrival and a stop request both raise the wake signal,
            // so poll for an event regardless of how we woke up.
            let received = ctx.inbound.try_pop();
            let got_event = received.is_some();
            if let Some(event) = received {
                if let Err(error) = self.handler.handle_event(ctx, event) {
                    tracing::error!(worker = ctx.name(), error = %error, "event handler failed");
                }
                // The task is done even when the handler failed.
                ctx.inbound.task_done();
            }

            if ctx.stop.is_set() && !got_event {
                break;
            }

            self.handler.post_event(ctx);
        }

        self.handler.post_run(ctx);
    }
}

/// An event-consuming worker: threaded harness plus typed dispatch.
pub struct EventWorker<H: EventHandler> {
    inner: ThreadWorker<EventTask<H>>,
}

impl<H: EventHandler> EventWorker<H> {
    pub fn new(name: impl Into<String>, handler: H) -> Self {
        Self {
            inner: ThreadWorker::new(name, EventTask::new(handler)),
        }
    }

    /// Direct delivery, bypassing the loop. This is also the only legal way
    /// for a worker to feed itself.
    pub fn event(&self, event: H::Event) {
        self.inner.send(event);
    }

    pub fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    /// Test hook: block until every queued inbound event has been handled.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        self.inner.wait_drained(timeout)
    }
}

impl<H> Worker for EventWorker<H>
where
    H: EventHandler<Event = WorkerEvent>,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        self.inner.start()
    }

    fn stop(&mut self, timeout: Option<Duration>) -> Result<(), WorkerError> {
        self.inner.stop(timeout)
    }

    fn outbound(&self) -> Arc<crate::queue::EventQueue<WorkerEvent>> {
        self.inner.outbound()
    }

    fn subscription(&self) -> Option<Subscription> {
        Some(Subscription {
            consumes: H::CONSUMES,
            sender: self.inner.sender(),
        })
    }
}

#[cfg(test)]
#[path = "event_worker_tests.rs"]
mod tests;
