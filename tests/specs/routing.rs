// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loop-level routing and teardown behavior with real workers.

use crate::prelude::{add_recorder, wait_for};
use cas_adapters::FakeAcsStore;
use cas_core::{AccessCard, WorkerEvent};
use cas_engine::workers::CardPushedWatcher;
use cas_engine::{EventWorker, WorkerEventLoop};
use std::thread;
use std::time::Duration;

#[test]
fn restart_is_terminal() {
    let mut event_loop = WorkerEventLoop::new();
    event_loop.start().unwrap();
    let first = add_recorder(&mut event_loop);
    let second = add_recorder(&mut event_loop);

    assert!(event_loop.is_alive());
    event_loop.event(WorkerEvent::ApplicationRestartNeeded);

    assert!(wait_for(Duration::from_secs(5), || !event_loop.is_alive()));

    // Nothing routed after the terminal event.
    event_loop.event(WorkerEvent::AcsDatabaseUpdated);
    thread::sleep(Duration::from_millis(200));
    assert!(first.lock().is_empty());
    assert!(second.lock().is_empty());

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
}

#[test]
fn card_push_completion_is_announced_exactly_once() {
    let acs = FakeAcsStore::new();
    acs.insert_location(3, 7);
    acs.insert_card(
        AccessCard {
            id: 5,
            card_number: 3000,
        },
        101,
    );
    acs.upsert_loc_card(cas_adapters::LocCardRow {
        id: 900,
        card_id: 5,
        location_id: 3,
        download_pending: true,
    });

    let mut event_loop = WorkerEventLoop::new();
    event_loop.start().unwrap();
    let seen = add_recorder(&mut event_loop);
    let watcher = CardPushedWatcher::new(acs.clone(), 7).unwrap();
    event_loop
        .add(EventWorker::new("card-pushed-watcher", watcher))
        .unwrap();

    // The mapping is written but the hardware has not consumed it yet.
    event_loop.event(WorkerEvent::LocCardUpdated {
        id: 900,
        card_id: 5,
        location_id: 3,
    });
    thread::sleep(Duration::from_millis(300));
    assert!(
        !seen
            .lock()
            .iter()
            .any(|event| matches!(event, WorkerEvent::AccessCardPushed { .. })),
        "no push announcement while the download flag is set"
    );

    // The vendor clears the flag and the store update lands.
    acs.mark_downloaded(900);
    event_loop.event(WorkerEvent::AcsDatabaseUpdated);

    assert!(wait_for(Duration::from_secs(3), || {
        seen.lock()
            .iter()
            .any(|event| matches!(event, WorkerEvent::AccessCardPushed { .. }))
    }));

    // And only once, even after further store updates.
    event_loop.event(WorkerEvent::AcsDatabaseUpdated);
    thread::sleep(Duration::from_millis(300));
    let pushed: Vec<AccessCard> = seen
        .lock()
        .iter()
        .filter_map(|event| match event {
            WorkerEvent::AccessCardPushed { card } => Some(*card),
            _ => None,
        })
        .collect();
    assert_eq!(
        pushed,
        vec![AccessCard {
            id: 5,
            card_number: 3000
        }]
    );

    event_loop.stop(Some(Duration::from_secs(5))).unwrap();
}
