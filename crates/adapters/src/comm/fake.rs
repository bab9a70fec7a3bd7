// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake comm server for deterministic worker tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CommError, CommServer, EventCursors};
use cas_core::DoorState;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A recorded door override request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorCommand {
    pub location_id: i64,
    pub door_number: i64,
    pub state: DoorState,
}

#[derive(Default)]
struct FakeCommState {
    commands: Vec<DoorCommand>,
    fetches: Vec<EventCursors>,
    /// Responses for upcoming fetches; empty batches once exhausted.
    scripted_lines: VecDeque<Vec<String>>,
    override_accepted: bool,
}

/// Records every override and serves scripted event-query batches.
#[derive(Clone)]
pub struct FakeCommServer {
    state: Arc<Mutex<FakeCommState>>,
}

impl Default for FakeCommServer {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCommServer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeCommState {
                override_accepted: true,
                ..FakeCommState::default()
            })),
        }
    }

    /// All door overrides issued so far.
    pub fn commands(&self) -> Vec<DoorCommand> {
        self.state.lock().commands.clone()
    }

    /// Cursor values of every fetch issued so far.
    pub fn fetches(&self) -> Vec<EventCursors> {
        self.state.lock().fetches.clone()
    }

    /// Queue one event-query response batch.
    pub fn push_lines(&self, lines: Vec<String>) {
        self.state.lock().scripted_lines.push_back(lines);
    }

    /// Make subsequent overrides report failure (empty reply).
    pub fn reject_overrides(&self) {
        self.state.lock().override_accepted = false;
    }
}

impl CommServer for FakeCommServer {
    fn set_door_state(
        &self,
        location_id: i64,
        door_number: i64,
        state: DoorState,
    ) -> Result<bool, CommError> {
        let mut fake = self.state.lock();
        fake.commands.push(DoorCommand {
            location_id,
            door_number,
            state,
        });
        Ok(fake.override_accepted)
    }

    fn fetch_events(&self, cursors: EventCursors) -> Result<Vec<String>, CommError> {
        let mut fake = self.state.lock();
        fake.fetches.push(cursors);
        Ok(fake.scripted_lines.pop_front().unwrap_or_default())
    }
}
