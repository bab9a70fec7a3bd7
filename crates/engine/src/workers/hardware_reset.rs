// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watchdog for stuck controller downloads.
//!
//! A location download normally completes within about forty seconds. When
//! one has been pending for over three minutes the controllers have almost
//! certainly wedged; the cure is a power-cycle through the reset board plus
//! a comm-server restart. Resets are rate-limited to one per ten minutes.

use crate::event_worker::{EventHandler, Periodic};
use crate::worker::TaskContext;
use cas_adapters::reset::ResetEndpoint;
use cas_adapters::store::{AcsStore, StoreError};
use cas_core::{Clock, EventKind, WorkerEvent};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// How long a download may stay pending before we reset.
const DOWNLOAD_STUCK_AFTER: Duration = Duration::from_secs(3 * 60);
/// Minimum gap between resets.
const RESET_BACKOFF: Duration = Duration::from_secs(10 * 60);
/// The database update event can be missed; re-read the store every minute
/// regardless.
const SYNC_PERIOD: Duration = Duration::from_secs(60);

pub struct HardwareResetWorker<A, R, C> {
    acs: A,
    endpoint: R,
    clock: C,
    /// When each location's download was first observed pending.
    pending_since: HashMap<i64, Instant>,
    next_allowed_reset: Instant,
}

impl<A: AcsStore, R: ResetEndpoint, C: Clock> HardwareResetWorker<A, R, C> {
    pub fn new(acs: A, endpoint: R, clock: C) -> Self {
        let next_allowed_reset = clock.now();
        Self {
            acs,
            endpoint,
            clock,
            pending_since: HashMap::new(),
            next_allowed_reset,
        }
    }

    /// Refresh the pending-download set from the store: start tracking new
    /// entries, forget locations that finished.
    fn sync_pending(&mut self) -> Result<(), StoreError> {
        let downloading: HashSet<i64> = self.acs.locations_downloading()?.into_iter().collect();
        let now = self.clock.now();

        for location in &downloading {
            self.pending_since.entry(*location).or_insert(now);
        }
        self.pending_since
            .retain(|location, _| downloading.contains(location));
        Ok(())
    }

    fn sync_tick(&mut self, _ctx: &TaskContext) {
        if let Err(error) = self.sync_pending() {
            tracing::warn!(error = %error, "failed to refresh pending downloads");
        }
    }

    fn maybe_reset(&mut self, ctx: &TaskContext) {
        let now = self.clock.now();
        if now < self.next_allowed_reset {
            return;
        }
        let stuck = self
            .pending_since
            .values()
            .any(|since| now.duration_since(*since) >= DOWNLOAD_STUCK_AFTER);
        if !stuck {
            return;
        }

        // Arm the back-off first so a failing endpoint is not hammered.
        self.next_allowed_reset = now + RESET_BACKOFF;
        tracing::warn!("download pending for over three minutes, resetting door hardware");
        ctx.emit(WorkerEvent::CommServerRestartRequested);
        if let Err(error) = self.endpoint.reset() {
            tracing::warn!(error = %error, "hardware reset request failed");
        }
    }
}

impl<A: AcsStore, R: ResetEndpoint, C: Clock> EventHandler for HardwareResetWorker<A, R, C> {
    type Event = WorkerEvent;
    type Error = StoreError;
    const CONSUMES: &'static [EventKind] = &[EventKind::AcsDatabaseUpdated];

    fn handle_event(&mut self, _ctx: &TaskContext, event: WorkerEvent) -> Result<(), StoreError> {
        match event {
            WorkerEvent::AcsDatabaseUpdated => self.sync_pending(),
            _ => Ok(()),
        }
    }

    fn post_event(&mut self, ctx: &TaskContext) {
        self.maybe_reset(ctx);
    }

    fn periodics() -> Vec<Periodic<Self>> {
        vec![Periodic::new(SYNC_PERIOD, Self::sync_tick)]
    }
}

#[cfg(test)]
#[path = "hardware_reset_tests.rs"]
mod tests;
