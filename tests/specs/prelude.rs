// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the behavioral specs.

use cas_core::{EventKind, WorkerEvent};
use cas_engine::{EventHandler, EventWorker, TaskContext, WorkerEventLoop};
use parking_lot::Mutex;
use std::convert::Infallible;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}

/// Records every event routed to it; the loop's outbound instrument.
pub struct Recorder {
    seen: Arc<Mutex<Vec<WorkerEvent>>>,
}

impl Recorder {
    pub fn new() -> (Self, Arc<Mutex<Vec<WorkerEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

impl EventHandler for Recorder {
    type Event = WorkerEvent;
    type Error = Infallible;
    const CONSUMES: &'static [EventKind] = &[
        EventKind::AcsDatabaseUpdated,
        EventKind::LogDatabaseUpdated,
        EventKind::CommServerRestartRequested,
        EventKind::CardScanned,
        EventKind::AccessCardUpdated,
        EventKind::LocCardUpdated,
        EventKind::AccessCardPushed,
        EventKind::DoorStateUpdate,
        EventKind::RawCommServerEvent,
        EventKind::RawCommServerMessage,
    ];

    fn handle_event(&mut self, _ctx: &TaskContext, event: WorkerEvent) -> Result<(), Infallible> {
        self.seen.lock().push(event);
        Ok(())
    }
}

/// Register a recorder with the loop and return its captured-event handle.
pub fn add_recorder(event_loop: &mut WorkerEventLoop) -> Arc<Mutex<Vec<WorkerEvent>>> {
    let (recorder, seen) = Recorder::new();
    event_loop
        .add(EventWorker::new("recorder", recorder))
        .unwrap();
    seen
}
