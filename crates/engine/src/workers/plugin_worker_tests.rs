// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cas_core::{AccessCard, CardScan, CommServerEventKind, FakeClock, Plugin};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
struct TestPlugin {
    calls: Arc<Mutex<Vec<String>>>,
    fail_scans: bool,
    poll_wait: Option<Duration>,
}

impl TestPlugin {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

impl Plugin for TestPlugin {
    fn name(&self) -> &str {
        "test"
    }

    fn startup(&mut self) -> Result<(), PluginError> {
        self.record("startup");
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), PluginError> {
        self.record("shutdown");
        Ok(())
    }

    fn card_scanned(&mut self, scan: &CardScan) -> Result<(), PluginError> {
        self.record(format!("scan:{}", scan.card_number));
        if self.fail_scans {
            return Err("scan handler broke".into());
        }
        Ok(())
    }

    fn card_data_pushed(&mut self, card: &AccessCard) -> Result<(), PluginError> {
        self.record(format!("pushed:{}", card.id));
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<Duration>, PluginError> {
        self.record("poll");
        Ok(self.poll_wait)
    }

    fn on_error(&mut self, error: &PluginError) {
        self.record(format!("error:{error}"));
    }
}

fn ctx() -> TaskContext {
    TaskContext::new("test")
}

fn scan() -> CardScan {
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

#[test]
fn dispatches_events_to_the_matching_facets() {
    let plugin = TestPlugin::default();
    let mut worker = PluginWorker::new(plugin.clone(), FakeClock::new());
    let ctx = ctx();

    worker.pre_run(&ctx);
    worker.handle_event(&ctx, WorkerEvent::CardScanned { scan: scan() }).unwrap();
    worker
        .handle_event(
            &ctx,
            WorkerEvent::AccessCardPushed {
                card: AccessCard {
                    id: 5,
                    card_number: 3000,
                },
            },
        )
        .unwrap();
    worker.post_run(&ctx);

    assert_eq!(
        plugin.calls(),
        vec!["startup", "scan:3000", "pushed:5", "shutdown"]
    );
}

#[test]
fn unrelated_events_touch_no_facet() {
    let plugin = TestPlugin::default();
    let mut worker = PluginWorker::new(plugin.clone(), FakeClock::new());
    let ctx = ctx();

    worker.handle_event(&ctx, WorkerEvent::AcsDatabaseUpdated).unwrap();

    assert!(plugin.calls().is_empty());
}

#[test]
fn honors_the_plugin_supplied_poll_deadline() {
    let plugin = TestPlugin {
        poll_wait: Some(Duration::from_secs(10)),
        ..TestPlugin::default()
    };
    let clock = FakeClock::new();
    let mut worker = PluginWorker::new(plugin.clone(), clock.clone());
    let ctx = ctx();

    worker.post_event(&ctx);
    worker.post_event(&ctx);
    assert_eq!(plugin.calls(), vec!["poll"], "deadline not reached yet");

    clock.advance(Duration::from_secs(10));
    worker.post_event(&ctx);
    assert_eq!(plugin.calls(), vec!["poll", "poll"]);
}

#[test]
fn a_plugin_without_periodic_work_is_polled_each_iteration() {
    let plugin = TestPlugin::default();
    let clock = FakeClock::new();
    let mut worker = PluginWorker::new(plugin.clone(), clock.clone());
    let ctx = ctx();

    worker.post_event(&ctx);
    worker.post_event(&ctx);

    assert_eq!(plugin.calls(), vec!["poll", "poll"]);
}

#[test]
fn facet_errors_reach_on_error_and_the_worker_survives() {
    let plugin = TestPlugin {
        fail_scans: true,
        ..TestPlugin::default()
    };
    let mut worker = PluginWorker::new(plugin.clone(), FakeClock::new());
    let ctx = ctx();

    worker.handle_event(&ctx, WorkerEvent::CardScanned { scan: scan() }).unwrap();
    worker
        .handle_event(
            &ctx,
            WorkerEvent::AccessCardPushed {
                card: AccessCard {
                    id: 5,
                    card_number: 3000,
                },
            },
        )
        .unwrap();

    assert_eq!(
        plugin.calls(),
        vec!["scan:3000", "error:scan handler broke", "pushed:5"]
    );
}
