// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker event union routed by the event loop.

use crate::card::AccessCard;
use crate::door::DoorState;
use crate::message::{RawCommServerEvent, RawCommServerMessage};
use crate::scan::CardScan;
use std::time::Duration;

/// Events exchanged between workers.
///
/// The union is closed: adding a variant means extending this enum and the
/// matching [`EventKind`] tag. Payloads are immutable snapshots; fan-out
/// clones the event per subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// The configuration/state store changed on disk.
    AcsDatabaseUpdated,
    /// The event-log store changed on disk.
    LogDatabaseUpdated,
    /// The vendor comm server process should be bounced.
    CommServerRestartRequested,
    /// A badge read was observed.
    CardScanned { scan: CardScan },
    /// An in-memory card record was re-written to the store.
    AccessCardUpdated { card: AccessCard },
    /// A per-location card mapping was re-written. Fired explicitly so a
    /// worker watching card pushes doesn't have to diff the whole store.
    LocCardUpdated {
        id: i64,
        card_id: i64,
        location_id: i64,
    },
    /// Every per-location mapping for the card has reached the hardware.
    AccessCardPushed { card: AccessCard },
    /// Commanded door override.
    DoorStateUpdate {
        location_id: i64,
        door_number: i64,
        state: DoorState,
        timeout: Option<Duration>,
    },
    /// Parsed vendor telemetry packet.
    RawCommServerEvent(RawCommServerEvent),
    /// Outer-frame parse of a comm server line.
    RawCommServerMessage(RawCommServerMessage),
    /// Terminal: the loop must unwind.
    ApplicationRestartNeeded,
}

/// Field-less tag identifying a [`WorkerEvent`] variant.
///
/// Subscription tables are keyed by tag; [`WorkerEvent::kind`] is the only
/// mapping between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AcsDatabaseUpdated,
    LogDatabaseUpdated,
    CommServerRestartRequested,
    CardScanned,
    AccessCardUpdated,
    LocCardUpdated,
    AccessCardPushed,
    DoorStateUpdate,
    RawCommServerEvent,
    RawCommServerMessage,
    ApplicationRestartNeeded,
}

impl WorkerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkerEvent::AcsDatabaseUpdated => EventKind::AcsDatabaseUpdated,
            WorkerEvent::LogDatabaseUpdated => EventKind::LogDatabaseUpdated,
            WorkerEvent::CommServerRestartRequested => EventKind::CommServerRestartRequested,
            WorkerEvent::CardScanned { .. } => EventKind::CardScanned,
            WorkerEvent::AccessCardUpdated { .. } => EventKind::AccessCardUpdated,
            WorkerEvent::LocCardUpdated { .. } => EventKind::LocCardUpdated,
            WorkerEvent::AccessCardPushed { .. } => EventKind::AccessCardPushed,
            WorkerEvent::DoorStateUpdate { .. } => EventKind::DoorStateUpdate,
            WorkerEvent::RawCommServerEvent(_) => EventKind::RawCommServerEvent,
            WorkerEvent::RawCommServerMessage(_) => EventKind::RawCommServerMessage,
            WorkerEvent::ApplicationRestartNeeded => EventKind::ApplicationRestartNeeded,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
