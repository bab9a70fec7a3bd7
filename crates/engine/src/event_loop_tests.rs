// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::event_worker::EventWorker;
use cas_core::WorkerEvent;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Records everything routed to it.
struct Sink {
    seen: Arc<Mutex<Vec<WorkerEvent>>>,
    stopped: Arc<AtomicBool>,
}

macro_rules! sink_handler {
    ($name:ident, $($kind:ident),+) => {
        struct $name(Sink);

        impl EventHandler for $name {
            type Event = WorkerEvent;
            type Error = Infallible;
            const CONSUMES: &'static [EventKind] = &[$(EventKind::$kind),+];

            fn handle_event(
                &mut self,
                _ctx: &TaskContext,
                event: WorkerEvent,
            ) -> Result<(), Infallible> {
                self.0.seen.lock().push(event);
                Ok(())
            }

            fn post_run(&mut self, _ctx: &TaskContext) {
                self.0.stopped.store(true, Ordering::SeqCst);
            }
        }
    };
}

sink_handler!(AcceptingSink, AcsDatabaseUpdated);
sink_handler!(LogSink, LogDatabaseUpdated);
sink_handler!(UnionSink, AcsDatabaseUpdated, LogDatabaseUpdated);

fn sink() -> (Sink, Arc<Mutex<Vec<WorkerEvent>>>, Arc<AtomicBool>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let stopped = Arc::new(AtomicBool::new(false));
    (
        Sink {
            seen: Arc::clone(&seen),
            stopped: Arc::clone(&stopped),
        },
        seen,
        stopped,
    )
}

/// Emits a fixed batch of events from `pre_run`, consuming nothing.
struct Emitter {
    batch: Vec<WorkerEvent>,
    seen: Arc<Mutex<Vec<WorkerEvent>>>,
}

impl Emitter {
    fn new(batch: Vec<WorkerEvent>) -> (Self, Arc<Mutex<Vec<WorkerEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                batch,
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

impl EventHandler for Emitter {
    type Event = WorkerEvent;
    type Error = Infallible;
    const CONSUMES: &'static [EventKind] = &[];

    fn handle_event(&mut self, _ctx: &TaskContext, event: WorkerEvent) -> Result<(), Infallible> {
        self.seen.lock().push(event);
        Ok(())
    }

    fn pre_run(&mut self, ctx: &TaskContext) {
        for event in self.batch.drain(..) {
            ctx.emit(event);
        }
    }
}

/// Emits to and subscribes on the same variant, to prove the loop never
/// feeds a worker its own events.
struct SelfProducer {
    emitter: Emitter,
}

impl EventHandler for SelfProducer {
    type Event = WorkerEvent;
    type Error = Infallible;
    const CONSUMES: &'static [EventKind] = &[EventKind::LogDatabaseUpdated];

    fn handle_event(&mut self, ctx: &TaskContext, event: WorkerEvent) -> Result<(), Infallible> {
        self.emitter.handle_event(ctx, event)
    }

    fn pre_run(&mut self, ctx: &TaskContext) {
        self.emitter.pre_run(ctx);
    }
}

fn started_loop() -> WorkerEventLoop {
    let mut event_loop = WorkerEventLoop::new();
    event_loop.start().unwrap();
    event_loop
}

#[test]
fn routes_events_to_subscribed_workers() {
    let mut event_loop = started_loop();
    let (accepting, seen, _stopped) = sink();
    let (emitter, _emitter_seen) = Emitter::new(vec![WorkerEvent::AcsDatabaseUpdated]);

    // Register the consumer first since the emitter fires immediately.
    event_loop.add(EventWorker::new("accepting", AcceptingSink(accepting))).unwrap();
    event_loop.add(EventWorker::new("emitting", emitter)).unwrap();

    assert!(wait_for(Duration::from_secs(3), || !seen.lock().is_empty()));
    assert_eq!(*seen.lock(), vec![WorkerEvent::AcsDatabaseUpdated]);

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
}

#[test]
fn does_not_route_unwanted_events() {
    let mut event_loop = started_loop();
    let (unaccepting, seen, _stopped) = sink();
    let (emitter, _emitter_seen) = Emitter::new(vec![WorkerEvent::AcsDatabaseUpdated]);

    event_loop.add(EventWorker::new("log-only", LogSink(unaccepting))).unwrap();
    event_loop.add(EventWorker::new("emitting", emitter)).unwrap();

    assert!(!wait_for(Duration::from_millis(300), || !seen.lock().is_empty()));

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
    assert!(seen.lock().is_empty());
}

#[test]
fn union_subscribers_receive_every_declared_variant() {
    let mut event_loop = started_loop();
    let (union, seen, _stopped) = sink();
    let (emitter, _emitter_seen) = Emitter::new(vec![
        WorkerEvent::AcsDatabaseUpdated,
        WorkerEvent::LogDatabaseUpdated,
        WorkerEvent::CommServerRestartRequested,
    ]);

    event_loop.add(EventWorker::new("union", UnionSink(union))).unwrap();
    event_loop.add(EventWorker::new("emitting", emitter)).unwrap();

    assert!(wait_for(Duration::from_secs(3), || seen.lock().len() >= 2));
    assert_eq!(
        *seen.lock(),
        vec![
            WorkerEvent::AcsDatabaseUpdated,
            WorkerEvent::LogDatabaseUpdated,
        ]
    );

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
}

#[test]
fn each_subscriber_sees_an_event_exactly_once() {
    let mut event_loop = started_loop();
    let (first, first_seen, _a) = sink();
    let (second, second_seen, _b) = sink();
    let (emitter, _emitter_seen) = Emitter::new(vec![WorkerEvent::AcsDatabaseUpdated]);

    event_loop.add(EventWorker::new("first", AcceptingSink(first))).unwrap();
    event_loop.add(EventWorker::new("second", AcceptingSink(second))).unwrap();
    event_loop.add(EventWorker::new("emitting", emitter)).unwrap();

    assert!(wait_for(Duration::from_secs(3), || {
        !first_seen.lock().is_empty() && !second_seen.lock().is_empty()
    }));
    // No duplicate delivery after dispatch has settled.
    thread::sleep(Duration::from_millis(100));
    assert_eq!(first_seen.lock().len(), 1);
    assert_eq!(second_seen.lock().len(), 1);

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
}

#[test]
fn preserves_per_producer_fifo_order_across_the_loop() {
    let mut event_loop = started_loop();
    let (consumer, seen, _stopped) = sink();

    let batch: Vec<WorkerEvent> = (0..30)
        .map(|id| WorkerEvent::LocCardUpdated {
            id,
            card_id: 1,
            location_id: 1,
        })
        .collect();

    struct LocSink(Sink);
    impl EventHandler for LocSink {
        type Event = WorkerEvent;
        type Error = Infallible;
        const CONSUMES: &'static [EventKind] = &[EventKind::LocCardUpdated];

        fn handle_event(&mut self, _ctx: &TaskContext, event: WorkerEvent) -> Result<(), Infallible> {
            self.0.seen.lock().push(event);
            Ok(())
        }
    }

    let (emitter, _emitter_seen) = Emitter::new(batch.clone());
    event_loop.add(EventWorker::new("loc-sink", LocSink(consumer))).unwrap();
    event_loop.add(EventWorker::new("emitting", emitter)).unwrap();

    assert!(wait_for(Duration::from_secs(3), || seen.lock().len() == 30));
    assert_eq!(*seen.lock(), batch);

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
}

#[test]
fn never_routes_an_event_back_to_its_producer() {
    let mut event_loop = started_loop();
    let (other, other_seen, _a) = sink();
    let (producer_inner, producer_seen) = Emitter::new(vec![WorkerEvent::LogDatabaseUpdated]);

    event_loop
        .add(EventWorker::new(
            "self-producer",
            SelfProducer {
                emitter: producer_inner,
            },
        ))
        .unwrap();
    event_loop.add(EventWorker::new("other", LogSink(other))).unwrap();

    assert!(wait_for(Duration::from_secs(3), || !other_seen.lock().is_empty()));
    thread::sleep(Duration::from_millis(100));

    assert_eq!(other_seen.lock().len(), 1);
    assert!(
        producer_seen.lock().is_empty(),
        "dispatch must skip the originating worker"
    );

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
}

#[test]
fn restart_event_is_terminal() {
    let mut event_loop = started_loop();
    let (accepting, seen, stopped) = sink();
    event_loop.add(EventWorker::new("accepting", AcceptingSink(accepting))).unwrap();

    assert!(event_loop.is_alive());
    event_loop.event(WorkerEvent::ApplicationRestartNeeded);

    assert!(event_loop.wait_drained(Duration::from_secs(3)));
    assert!(wait_for(Duration::from_secs(3), || !event_loop.is_alive()));

    // Registered workers are torn down by their monitors.
    assert!(wait_for(Duration::from_secs(5), || stopped.load(Ordering::SeqCst)));

    // Events after the terminal one are never routed.
    event_loop.event(WorkerEvent::AcsDatabaseUpdated);
    thread::sleep(Duration::from_millis(200));
    assert!(seen.lock().is_empty());

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
}

#[test]
fn stop_tears_down_registered_workers() {
    let mut event_loop = started_loop();
    let (accepting, _seen, stopped) = sink();
    event_loop.add(EventWorker::new("accepting", AcceptingSink(accepting))).unwrap();

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();

    assert!(stopped.load(Ordering::SeqCst));
    assert!(!event_loop.is_alive());
}
