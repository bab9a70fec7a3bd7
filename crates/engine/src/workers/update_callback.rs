// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridges lookup-layer write-backs into the event bus.
//!
//! The bridge is passive: no thread, no inbound queue. It publishes a
//! cloneable callback handle; the lookup layer invokes it after writing a
//! card or per-location row, and the invocation lands on the bridge's
//! outbound queue like any other worker emission. Ownership flows one way:
//! the data layer holds the handle, never the bridge.

use crate::queue::EventQueue;
use crate::worker::{Worker, WorkerError};
use cas_core::{CardUpdate, WorkerEvent};
use std::sync::Arc;
use std::time::Duration;

pub struct UpdateCallbackBridge {
    outbound: Arc<EventQueue<WorkerEvent>>,
}

impl UpdateCallbackBridge {
    pub fn new() -> Self {
        Self {
            outbound: Arc::new(EventQueue::new()),
        }
    }

    /// Handle published to the lookup layer.
    pub fn callback(&self) -> UpdateCallback {
        UpdateCallback {
            outbound: Arc::clone(&self.outbound),
        }
    }
}

impl Default for UpdateCallbackBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Worker for UpdateCallbackBridge {
    fn name(&self) -> &str {
        "update-callback-bridge"
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        Ok(()) // No thread to start.
    }

    fn stop(&mut self, _timeout: Option<Duration>) -> Result<(), WorkerError> {
        Ok(()) // No thread to stop.
    }

    fn outbound(&self) -> Arc<EventQueue<WorkerEvent>> {
        Arc::clone(&self.outbound)
    }
}

/// The callback value handed to the lookup layer.
#[derive(Clone)]
pub struct UpdateCallback {
    outbound: Arc<EventQueue<WorkerEvent>>,
}

impl UpdateCallback {
    pub fn invoke(&self, update: CardUpdate) {
        match update {
            CardUpdate::Access(card) => {
                self.outbound.push(WorkerEvent::AccessCardUpdated { card });
            }
            CardUpdate::Loc(loc_card) => {
                self.outbound.push(WorkerEvent::LocCardUpdated {
                    id: loc_card.id,
                    card_id: loc_card.card_id,
                    location_id: loc_card.location_id,
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "update_callback_tests.rs"]
mod tests;
