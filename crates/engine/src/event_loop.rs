// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker event loop: a typed pub/sub scheduler over the fleet.
//!
//! The loop is itself an event worker. Its inbound elements carry the
//! originating worker alongside the event so dispatch never feeds an event
//! back to its producer; self-feedback has to go through the worker's own
//! `event()` method. Registration wraps every worker in a monitor thread
//! that forwards its outbound queue into the loop.

use crate::event_worker::{EventHandler, EventTask};
use crate::queue::Signal;
use crate::worker::{EventSender, TaskContext, ThreadWorker, Worker, WorkerError};
use cas_core::{EventKind, WorkerEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Poll interval of each monitor thread.
const MONITOR_POLL: Duration = Duration::from_secs(1);
/// Timeout each worker is granted during teardown. Workers stop
/// concurrently, so teardown takes at most one timeout, not their sum.
const WORKER_STOP_TIMEOUT: Duration = Duration::from_secs(30);

const LOOP_NAME: &str = "worker-event-loop";

/// Identifies a registered worker within one loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerToken(usize);

/// Inbound element of the loop: an event plus where it came from.
#[derive(Debug, Clone)]
pub struct LoopMessage {
    pub origin: Option<WorkerToken>,
    pub event: WorkerEvent,
}

type SubscriptionTable = HashMap<EventKind, Vec<(WorkerToken, EventSender)>>;

#[derive(Clone)]
struct LoopControl {
    stop: Signal,
    wake: Signal,
    teardown: Signal,
}

impl LoopControl {
    /// Self-stop path: signal everything, never join.
    fn stop_no_join(&self) {
        self.stop.set();
        self.wake.set();
        self.teardown.set();
    }
}

/// The loop's own event handler: routes by variant tag.
struct Dispatcher {
    subscriptions: Arc<Mutex<SubscriptionTable>>,
    control: LoopControl,
    /// Set once a restart has been observed; nothing routes after that.
    terminal: bool,
}

impl EventHandler for Dispatcher {
    type Event = LoopMessage;
    type Error = Infallible;
    const CONSUMES: &'static [EventKind] = &[];

    fn handle_event(
        &mut self,
        _ctx: &TaskContext<LoopMessage>,
        message: LoopMessage,
    ) -> Result<(), Infallible> {
        let LoopMessage { origin, event } = message;

        // The restart event is terminal: messages still draining out of the
        // inbound queue afterwards are swallowed unrouted.
        if self.terminal {
            return Ok(());
        }
        tracing::debug!(event = ?event.kind(), "dispatching");

        if matches!(event, WorkerEvent::ApplicationRestartNeeded) {
            tracing::info!("application restart needed, stopping worker event loop");
            self.terminal = true;
            self.control.stop_no_join();
            return Ok(());
        }

        let table = self.subscriptions.lock();
        let Some(subscribers) = table.get(&event.kind()) else {
            return Ok(());
        };
        for (token, sender) in subscribers {
            if origin == Some(*token) {
                continue;
            }
            sender.send(event.clone());
        }
        Ok(())
    }
}

/// Owns the fleet: subscription table, monitor threads, and the dispatch
/// worker itself.
pub struct WorkerEventLoop {
    worker: ThreadWorker<EventTask<Dispatcher>>,
    subscriptions: Arc<Mutex<SubscriptionTable>>,
    teardown: Signal,
    monitors: Vec<JoinHandle<()>>,
    next_token: usize,
}

impl WorkerEventLoop {
    pub fn new() -> Self {
        let subscriptions: Arc<Mutex<SubscriptionTable>> = Arc::new(Mutex::new(HashMap::new()));
        let teardown = Signal::new();
        let ctx: TaskContext<LoopMessage> = TaskContext::new(LOOP_NAME);
        let dispatcher = Dispatcher {
            subscriptions: Arc::clone(&subscriptions),
            control: LoopControl {
                stop: ctx.stop_signal(),
                wake: ctx.wake_signal(),
                teardown: teardown.clone(),
            },
            terminal: false,
        };
        let worker = ThreadWorker::from_parts(LOOP_NAME.to_string(), ctx, EventTask::new(dispatcher));

        Self {
            worker,
            subscriptions,
            teardown,
            monitors: Vec::new(),
            next_token: 0,
        }
    }

    pub fn start(&mut self) -> Result<(), WorkerError> {
        self.worker.start()
    }

    pub fn is_alive(&self) -> bool {
        self.worker.is_alive()
    }

    /// Inject an event from outside the fleet.
    pub fn event(&self, event: WorkerEvent) {
        self.worker.send(LoopMessage {
            origin: None,
            event,
        });
    }

    /// Test hook: block until the loop has routed everything queued so far.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        self.worker.wait_drained(timeout)
    }

    /// Register, start, and monitor a worker. Insertion order fixes dispatch
    /// order for every variant the worker consumes; each worker is
    /// registered at most once per variant.
    pub fn add(&mut self, worker: impl Worker + 'static) -> Result<(), WorkerError> {
        self.add_boxed(Box::new(worker))
    }

    pub fn add_boxed(&mut self, mut worker: Box<dyn Worker>) -> Result<(), WorkerError> {
        let token = WorkerToken(self.next_token);
        self.next_token += 1;

        if let Some(subscription) = worker.subscription() {
            let mut table = self.subscriptions.lock();
            for kind in subscription.consumes {
                table
                    .entry(*kind)
                    .or_default()
                    .push((token, subscription.sender.clone()));
            }
        }

        worker.start()?;

        let outbound = worker.outbound();
        let loop_tx = self.worker.sender();
        let teardown = self.teardown.clone();
        let monitor_name = format!("{}-monitor", worker.name());
        let handle = thread::Builder::new()
            .name(monitor_name)
            .spawn(move || {
                while !teardown.is_set() {
                    if let Some(event) = outbound.pop_timeout(MONITOR_POLL) {
                        loop_tx.send(LoopMessage {
                            origin: Some(token),
                            event,
                        });
                    }
                }
                // Teardown: the monitor owns stopping its worker.
                if let Err(error) = worker.stop(Some(WORKER_STOP_TIMEOUT)) {
                    tracing::warn!(worker = worker.name(), error = %error, "worker did not stop cleanly");
                }
            })
            .map_err(WorkerError::Spawn)?;
        self.monitors.push(handle);
        Ok(())
    }

    /// Stop the loop, then tear down every monitor and its worker. Monitor
    /// teardown runs even when the loop's own join timed out.
    pub fn stop(&mut self, timeout: Option<Duration>) -> Result<(), WorkerError> {
        let result = self.worker.stop(timeout);
        self.teardown.set();
        for monitor in self.monitors.drain(..) {
            if monitor.join().is_err() {
                tracing::warn!("monitor thread panicked during teardown");
            }
        }
        result
    }
}

impl Default for WorkerEventLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "event_loop_tests.rs"]
mod tests;
