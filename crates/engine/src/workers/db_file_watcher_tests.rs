// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::queue::EventQueue;
use crate::worker::Worker;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn wait_for_event(
    outbound: &Arc<EventQueue<WorkerEvent>>,
    timeout: Duration,
) -> Option<WorkerEvent> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(event) = outbound.try_pop() {
            return Some(event);
        }
        thread::sleep(Duration::from_millis(20));
    }
    None
}

#[test]
fn reports_each_database_under_its_own_event() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let acs_path = root.join("AcsData.mdb");
    let log_path = root.join("Log.mdb");
    fs::write(&acs_path, b"acs").unwrap();
    fs::write(&log_path, b"log").unwrap();

    let mut worker = database_file_watcher(&acs_path, &log_path).unwrap();
    let outbound = worker.outbound();
    worker.start().unwrap();

    fs::write(&acs_path, b"acs changed").unwrap();
    assert_eq!(
        wait_for_event(&outbound, Duration::from_secs(5)),
        Some(WorkerEvent::AcsDatabaseUpdated)
    );

    fs::write(&log_path, b"log changed").unwrap();
    let mut saw_log_update = false;
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline && !saw_log_update {
        match wait_for_event(&outbound, Duration::from_millis(200)) {
            // Rewriting the ACS file may produce trailing modify events.
            Some(WorkerEvent::AcsDatabaseUpdated) => {}
            Some(WorkerEvent::LogDatabaseUpdated) => saw_log_update = true,
            Some(other) => panic!("unexpected event {other:?}"),
            None => {}
        }
    }
    assert!(saw_log_update);

    worker.stop(Some(Duration::from_secs(2))).unwrap();
}

#[test]
fn ignores_sibling_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let acs_path = root.join("AcsData.mdb");
    let log_path = root.join("Log.mdb");
    fs::write(&acs_path, b"acs").unwrap();
    fs::write(&log_path, b"log").unwrap();

    let mut worker = database_file_watcher(&acs_path, &log_path).unwrap();
    let outbound = worker.outbound();
    worker.start().unwrap();

    fs::write(root.join("Unrelated.mdb"), b"noise").unwrap();

    assert_eq!(wait_for_event(&outbound, Duration::from_millis(500)), None);

    worker.stop(Some(Duration::from_secs(2))).unwrap();
}
