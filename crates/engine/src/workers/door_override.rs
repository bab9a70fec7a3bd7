// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives door override commands and reconciles them against comm-server
//! echoes.
//!
//! A commanded override stays pending until the comm server echoes it back.
//! Pending doors are retried every five seconds. A matching echo confirms
//! the command and stops the retries; a mismatching echo means an operator
//! commanded something else, and we back off entirely. Overrides with a
//! timeout fall back to `Timezone` when the deadline expires, whether or
//! not the original command was confirmed.

use crate::event_worker::EventHandler;
use crate::worker::TaskContext;
use cas_adapters::comm::CommServer;
use cas_core::{Clock, CommServerEventKind, DoorState, EventKind, RawCommServerEvent, WorkerEvent};
use std::collections::HashMap;
use std::convert::Infallible;
use std::time::{Duration, Instant};

/// Minimum gap between network attempts for a door still awaiting its echo.
const RETRY_INTERVAL: Duration = Duration::from_secs(5);

type DoorKey = (i64, i64); // (location, door)

pub struct DoorOverrideController<D, C> {
    link: D,
    clock: C,
    pending: HashMap<DoorKey, DoorState>,
    deadlines: HashMap<DoorKey, Instant>,
    attempts: HashMap<DoorKey, Instant>,
}

impl<D: CommServer, C: Clock> DoorOverrideController<D, C> {
    pub fn new(link: D, clock: C) -> Self {
        Self {
            link,
            clock,
            pending: HashMap::new(),
            deadlines: HashMap::new(),
            attempts: HashMap::new(),
        }
    }

    fn handle_state_update(
        &mut self,
        location_id: i64,
        door_number: i64,
        state: DoorState,
        timeout: Option<Duration>,
    ) {
        let key = (location_id, door_number);
        self.pending.insert(key, state);
        // Clear the attempt stamp so the next tick fires immediately.
        self.attempts.remove(&key);
        match timeout {
            Some(timeout) => {
                self.deadlines.insert(key, self.clock.now() + timeout);
            }
            None => {
                self.deadlines.remove(&key);
            }
        }
    }

    fn handle_echo(&mut self, raw: &RawCommServerEvent) {
        let Some(kind) = raw.event_kind() else {
            return;
        };
        let Some(location_id) = raw.location_id() else {
            return;
        };
        match kind {
            CommServerEventKind::OprSetOutputOpen => {
                self.settle_single(location_id, raw.device(), DoorState::Open);
            }
            CommServerEventKind::OprSetOutputSecure => {
                self.settle_single(location_id, raw.device(), DoorState::Secure);
            }
            CommServerEventKind::OprSetOutputTz => {
                self.settle_single(location_id, raw.device(), DoorState::Timezone);
            }
            CommServerEventKind::OprSetOutputAllOpen => {
                self.settle_all(location_id, DoorState::Open);
            }
            CommServerEventKind::OprSetOutputAllTimeZone => {
                self.settle_all(location_id, DoorState::Timezone);
            }
            _ => {}
        }
    }

    fn settle_single(&mut self, location_id: i64, door: Option<i64>, echoed: DoorState) {
        let Some(door_number) = door else {
            return;
        };
        let key = (location_id, door_number);
        let Some(pending) = self.pending.get(&key).copied() else {
            return;
        };

        if pending == echoed {
            // Confirmed: stop retrying. A running timeout stays so the door
            // still falls back to its schedule later.
            self.pending.remove(&key);
            self.attempts.remove(&key);
        } else {
            // An operator commanded something else; give up on this door.
            tracing::info!(
                location_id,
                door_number,
                ?pending,
                ?echoed,
                "door override preempted by operator"
            );
            self.pending.remove(&key);
            self.deadlines.remove(&key);
            self.attempts.remove(&key);
        }
    }

    /// Multi-door echoes decompose into per-door synthetic echoes over a
    /// snapshot of the pending keys; settling mutates the map underneath.
    fn settle_all(&mut self, location_id: i64, echoed: DoorState) {
        let doors: Vec<i64> = self
            .pending
            .keys()
            .filter(|(location, _)| *location == location_id)
            .map(|(_, door)| *door)
            .collect();
        for door_number in doors {
            self.settle_single(location_id, Some(door_number), echoed);
        }
    }

    fn tick(&mut self) {
        let now = self.clock.now();

        // Expired overrides fall back to schedule control.
        let expired: Vec<DoorKey> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| *key)
            .collect();
        for key in expired {
            self.deadlines.remove(&key);
            self.attempts.remove(&key);
            self.pending.insert(key, DoorState::Timezone);
        }

        // Fire or retry pending overrides.
        let due: Vec<(DoorKey, DoorState)> = self
            .pending
            .iter()
            .filter(|(key, _)| {
                self.attempts
                    .get(key)
                    .map_or(true, |last| now.duration_since(*last) >= RETRY_INTERVAL)
            })
            .map(|(key, state)| (*key, *state))
            .collect();
        for ((location_id, door_number), state) in due {
            match self.link.set_door_state(location_id, door_number, state) {
                Ok(true) => {
                    tracing::debug!(location_id, door_number, ?state, "door override sent");
                }
                Ok(false) => {
                    tracing::warn!(
                        location_id,
                        door_number,
                        ?state,
                        "door override not acknowledged"
                    );
                }
                Err(error) => {
                    tracing::warn!(location_id, door_number, error = %error, "door override failed");
                }
            }
            self.attempts.insert((location_id, door_number), now);
        }
    }
}

impl<D: CommServer, C: Clock> EventHandler for DoorOverrideController<D, C> {
    type Event = WorkerEvent;
    type Error = Infallible;
    const CONSUMES: &'static [EventKind] =
        &[EventKind::DoorStateUpdate, EventKind::RawCommServerEvent];

    fn handle_event(&mut self, _ctx: &TaskContext, event: WorkerEvent) -> Result<(), Infallible> {
        match event {
            WorkerEvent::DoorStateUpdate {
                location_id,
                door_number,
                state,
                timeout,
            } => self.handle_state_update(location_id, door_number, state, timeout),
            WorkerEvent::RawCommServerEvent(raw) => self.handle_echo(&raw),
            _ => {}
        }
        Ok(())
    }

    fn post_event(&mut self, _ctx: &TaskContext) {
        self.tick();
    }
}

#[cfg(test)]
#[path = "door_override_tests.rs"]
mod tests;
