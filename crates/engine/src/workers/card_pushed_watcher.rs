// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Announces when a card's data has fully reached the hardware.
//!
//! The vendor clears a `LocCards` row's download flag (or deletes the row)
//! once the controllers for that location have consumed it. This watcher
//! tracks the outstanding rows per card and emits exactly one
//! `AccessCardPushed` when the last location clears.

use crate::event_worker::EventHandler;
use crate::worker::TaskContext;
use cas_adapters::store::{AcsStore, StoreError};
use cas_core::{EventKind, WorkerEvent};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
struct PendingLocCard {
    card_id: i64,
    location_id: i64,
}

pub struct CardPushedWatcher<A> {
    acs: A,
    location_group: i64,
    /// Locations we are responsible for; rows elsewhere are ignored.
    locations: HashSet<i64>,
    /// Outstanding rows by `LocCards` id.
    pending_rows: HashMap<i64, PendingLocCard>,
    /// Locations still awaiting download, per card.
    card_locations: HashMap<i64, HashSet<i64>>,
}

impl<A: AcsStore> CardPushedWatcher<A> {
    pub fn new(acs: A, location_group: i64) -> Result<Self, StoreError> {
        let locations = acs.locations_in_group(location_group)?.into_iter().collect();
        Ok(Self {
            acs,
            location_group,
            locations,
            pending_rows: HashMap::new(),
            card_locations: HashMap::new(),
        })
    }

    fn watch(&mut self, id: i64, info: PendingLocCard) {
        if self.pending_rows.contains_key(&id) {
            return; // Still waiting on this row.
        }
        if !self.locations.contains(&info.location_id) {
            return; // Not a location we watch over.
        }
        self.pending_rows.insert(id, info);
        self.card_locations
            .entry(info.card_id)
            .or_default()
            .insert(info.location_id);
    }

    /// Re-check every outstanding row against the store. A deleted row
    /// counts as consumed too: that is how a revoked card leaves the
    /// hardware.
    fn refresh_pending(&mut self) -> Result<(), StoreError> {
        if self.pending_rows.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = self.pending_rows.keys().copied().collect();
        let rows = self.acs.loc_cards_by_ids(&ids)?;
        let by_id: HashMap<i64, bool> = rows
            .iter()
            .map(|row| (row.id, row.download_pending))
            .collect();

        let snapshot: Vec<(i64, PendingLocCard)> = self
            .pending_rows
            .iter()
            .map(|(id, info)| (*id, *info))
            .collect();
        for (id, info) in snapshot {
            let consumed = match by_id.get(&id) {
                None => true,
                Some(download_pending) => !download_pending,
            };
            if !consumed {
                continue;
            }
            if let Some(locations) = self.card_locations.get_mut(&info.card_id) {
                locations.remove(&info.location_id);
            }
            self.pending_rows.remove(&id);
        }
        Ok(())
    }

    /// Emit one `AccessCardPushed` per card whose pending set emptied, then
    /// drop the bookkeeping for that card.
    fn notify_pushed(&mut self, ctx: &TaskContext) -> Result<(), StoreError> {
        let finished: Vec<i64> = self
            .card_locations
            .iter()
            .filter(|(_, locations)| locations.is_empty())
            .map(|(card_id, _)| *card_id)
            .collect();

        for card_id in finished {
            self.card_locations.remove(&card_id);
            match self.acs.access_card(card_id)? {
                Some(card) => ctx.emit(WorkerEvent::AccessCardPushed { card }),
                None => tracing::warn!(card_id, "pushed card no longer exists in the store"),
            }
        }
        Ok(())
    }

    /// Pick up pending rows we have not been told about, e.g. writes made
    /// by the vendor's own tools.
    fn adopt_pending_rows(&mut self) -> Result<(), StoreError> {
        let rows = self.acs.pending_loc_cards(self.location_group)?;
        for row in rows {
            self.watch(
                row.id,
                PendingLocCard {
                    card_id: row.card_id,
                    location_id: row.location_id,
                },
            );
        }
        Ok(())
    }
}

impl<A: AcsStore> EventHandler for CardPushedWatcher<A> {
    type Event = WorkerEvent;
    type Error = StoreError;
    const CONSUMES: &'static [EventKind] = &[
        EventKind::AcsDatabaseUpdated,
        EventKind::AccessCardUpdated,
        EventKind::LocCardUpdated,
    ];

    fn handle_event(&mut self, ctx: &TaskContext, event: WorkerEvent) -> Result<(), StoreError> {
        if let WorkerEvent::LocCardUpdated {
            id,
            card_id,
            location_id,
        } = event
        {
            self.watch(
                id,
                PendingLocCard {
                    card_id,
                    location_id,
                },
            );
        }

        self.refresh_pending()?;
        self.notify_pushed(ctx)?;
        self.adopt_pending_rows()
    }
}

#[cfg(test)]
#[path = "card_pushed_watcher_tests.rs"]
mod tests;
