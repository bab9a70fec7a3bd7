// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns log-store rows and raw comm-server telemetry into `CardScanned`
//! events.
//!
//! The watcher keeps a monotonically increasing watermark of the newest
//! scan time it has seen. The log store is the canonical source of truth;
//! the raw socket feed is a low-latency preview of the same scans, so raw
//! events at or before the watermark are dropped as already reported.

use crate::event_worker::EventHandler;
use crate::worker::TaskContext;
use cas_adapters::store::{AcsStore, LogStore, ScanRow, StoreError};
use cas_core::{CardScan, CommServerEventKind, EventKind, RawCommServerEvent, WorkerEvent};
use chrono::NaiveDateTime;

pub struct CardScanWatcher<A, L> {
    acs: A,
    log: L,
    watermark: Option<NaiveDateTime>,
}

impl<A: AcsStore, L: LogStore> CardScanWatcher<A, L> {
    /// The watermark starts at the newest existing row, so history present
    /// before startup is never re-reported. An empty log store reports
    /// everything that arrives afterwards.
    pub fn new(acs: A, log: L) -> Result<Self, StoreError> {
        let watermark = log.latest_scan_time()?;
        Ok(Self {
            acs,
            log,
            watermark,
        })
    }

    fn advance_watermark(&mut self, time: NaiveDateTime) {
        // Rows may be handled out of order; keep the max.
        if self.watermark.map_or(true, |watermark| time > watermark) {
            self.watermark = Some(time);
        }
    }

    fn handle_log_database_update(&mut self, ctx: &TaskContext) -> Result<(), StoreError> {
        let rows = self.log.scans_after(self.watermark)?;
        for row in rows {
            if let Some(scan) = scan_from_row(&row) {
                ctx.emit(WorkerEvent::CardScanned { scan });
            }
            self.advance_watermark(row.time);
        }
        Ok(())
    }

    fn handle_raw_event(
        &mut self,
        ctx: &TaskContext,
        raw: &RawCommServerEvent,
    ) -> Result<(), StoreError> {
        let Some(timestamp) = raw.timestamp() else {
            return Ok(());
        };
        if self
            .watermark
            .map_or(false, |watermark| timestamp <= watermark)
        {
            // Already reported (or about to be) via the database path.
            return Ok(());
        }
        let Some(kind) = raw.event_kind() else {
            return Ok(());
        };
        if !kind.is_card_scan() {
            return Ok(());
        }
        let (Some(location_id), Some(device), Some(card_number)) =
            (raw.location_id(), raw.device(), raw.card_number())
        else {
            tracing::warn!("card scan telemetry packet is missing fields");
            return Ok(());
        };

        let name_id = self.acs.name_id_for_card(card_number)?;
        ctx.emit(WorkerEvent::CardScanned {
            scan: CardScan {
                name_id,
                card_number,
                scan_time: timestamp,
                device,
                event_type: kind,
                location_id,
            },
        });
        self.advance_watermark(timestamp);
        Ok(())
    }
}

fn scan_from_row(row: &ScanRow) -> Option<CardScan> {
    let kind = CommServerEventKind::try_from(row.event_code).ok()?;
    kind.is_card_scan().then(|| CardScan {
        name_id: row.name_id,
        card_number: row.card_number,
        scan_time: row.time,
        device: row.device,
        event_type: kind,
        location_id: row.location_id,
    })
}

impl<A: AcsStore, L: LogStore> EventHandler for CardScanWatcher<A, L> {
    type Event = WorkerEvent;
    type Error = StoreError;
    const CONSUMES: &'static [EventKind] =
        &[EventKind::LogDatabaseUpdated, EventKind::RawCommServerEvent];

    fn handle_event(&mut self, ctx: &TaskContext, event: WorkerEvent) -> Result<(), StoreError> {
        match event {
            WorkerEvent::LogDatabaseUpdated => self.handle_log_database_update(ctx),
            WorkerEvent::RawCommServerEvent(raw) => self.handle_raw_event(ctx, &raw),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "card_scan_watcher_tests.rs"]
mod tests;
