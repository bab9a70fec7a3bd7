// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Badge scans end to end: database file change → scan event, and raw
//! socket telemetry → scan event.

use crate::prelude::{add_recorder, wait_for};
use cas_adapters::{FakeAcsStore, SqliteAcsStore, SqliteLogStore};
use cas_core::{
    AccessCard, CardScan, CommServerEventKind, RawCommServerMessage, WorkerEvent,
};
use cas_engine::workers::{database_file_watcher, CardScanWatcher};
use cas_engine::{EventWorker, WorkerEventLoop};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::time::Duration;

fn expected_scan() -> CardScan {
    CardScan {
        name_id: Some(101),
        card_number: 3000,
        scan_time: NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        device: 0,
        event_type: CommServerEventKind::AccessGranted,
        location_id: 3,
    }
}

fn create_acs_db(path: &std::path::Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE NAMES (ID INTEGER PRIMARY KEY, FName TEXT, LName TEXT);
         CREATE TABLE CARDS (ID INTEGER PRIMARY KEY, NameID INTEGER, Code REAL);
         INSERT INTO NAMES (ID, FName, LName) VALUES (101, 'A', 'B');
         INSERT INTO CARDS (ID, NameID, Code) VALUES (5, 101, 3000.0);",
    )
    .unwrap();
}

fn create_log_db(path: &std::path::Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE EvnLog (TimeDate TEXT, Loc INTEGER, Event INTEGER, Dev INTEGER, Code REAL, Opr TEXT);",
    )
    .unwrap();
}

#[test]
fn a_log_database_write_becomes_a_card_scan_event() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let acs_path = root.join("AcsData.mdb");
    let log_path = root.join("Log.mdb");
    create_acs_db(&acs_path);
    create_log_db(&log_path);

    let mut event_loop = WorkerEventLoop::new();
    event_loop.start().unwrap();
    let seen = add_recorder(&mut event_loop);

    let scan_watcher = CardScanWatcher::new(
        SqliteAcsStore::open(&acs_path).unwrap(),
        SqliteLogStore::open(&log_path).unwrap(),
    )
    .unwrap();
    event_loop
        .add(EventWorker::new("card-scan-watcher", scan_watcher))
        .unwrap();
    event_loop
        .add(database_file_watcher(&acs_path, &log_path).unwrap())
        .unwrap();

    // A controller writes an access-granted row into the log store.
    let writer = Connection::open(&log_path).unwrap();
    writer
        .execute_batch(
            "INSERT INTO EvnLog (TimeDate, Loc, Event, Dev, Code, Opr)
             VALUES ('2025-01-02 00:00:00', 3, 8, 0, 3000.0, '101');",
        )
        .unwrap();
    drop(writer);

    assert!(wait_for(Duration::from_secs(3), || {
        seen.lock()
            .iter()
            .any(|event| matches!(event, WorkerEvent::CardScanned { .. }))
    }));

    let scans: Vec<CardScan> = seen
        .lock()
        .iter()
        .filter_map(|event| match event {
            WorkerEvent::CardScanned { scan } => Some(*scan),
            _ => None,
        })
        .collect();
    assert_eq!(scans, vec![expected_scan()]);

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
}

#[test]
fn a_raw_telemetry_packet_becomes_a_card_scan_event() {
    let acs = FakeAcsStore::new();
    acs.insert_card(
        AccessCard {
            id: 5,
            card_number: 3000,
        },
        101,
    );

    let mut event_loop = WorkerEventLoop::new();
    event_loop.start().unwrap();
    let seen = add_recorder(&mut event_loop);

    let scan_watcher = CardScanWatcher::new(acs, cas_adapters::FakeLogStore::new()).unwrap();
    event_loop
        .add(EventWorker::new("card-scan-watcher", scan_watcher))
        .unwrap();

    let line = "1 48 3 0 -1 0 8 0 0 1 2025 1 2 3 4 5 0 0 0 0 0 3000 82 0 *Front Door";
    let raw = RawCommServerMessage::parse(line).unwrap().event().unwrap();
    event_loop.event(WorkerEvent::RawCommServerEvent(raw));

    assert!(wait_for(Duration::from_secs(3), || {
        seen.lock()
            .iter()
            .any(|event| matches!(event, WorkerEvent::CardScanned { .. }))
    }));

    let scans: Vec<CardScan> = seen
        .lock()
        .iter()
        .filter_map(|event| match event {
            WorkerEvent::CardScanned { scan } => Some(*scan),
            _ => None,
        })
        .collect();
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].name_id, Some(101));
    assert_eq!(scans[0].card_number, 3000);
    assert_eq!(
        scans[0].scan_time,
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    );
    assert_eq!(scans[0].event_type, CommServerEventKind::AccessGranted);
    assert_eq!(scans[0].location_id, 3);
    assert_eq!(scans[0].device, 0);

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
}
