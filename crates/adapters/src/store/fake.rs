// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake stores for deterministic worker tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AcsStore, LocCardRow, LogStore, ScanRow, StoreError};
use cas_core::AccessCard;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct FakeAcsState {
    name_ids: HashMap<i64, i64>,
    cards: HashMap<i64, AccessCard>,
    locations: HashMap<i64, i64>,
    downloading: Vec<i64>,
    loc_cards: HashMap<i64, LocCardRow>,
}

/// In-memory ACS store. Clones share the same state so a test can mutate
/// rows while a worker owns another handle.
#[derive(Clone, Default)]
pub struct FakeAcsStore {
    state: Arc<Mutex<FakeAcsState>>,
}

impl FakeAcsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a card number to a person id.
    pub fn insert_card(&self, card: AccessCard, name_id: i64) {
        let mut state = self.state.lock();
        state.name_ids.insert(card.card_number, name_id);
        state.cards.insert(card.id, card);
    }

    /// Register a location within a location group.
    pub fn insert_location(&self, location_id: i64, location_group: i64) {
        self.state.lock().locations.insert(location_id, location_group);
    }

    pub fn set_downloading(&self, locations: Vec<i64>) {
        self.state.lock().downloading = locations;
    }

    /// Insert or replace a `LocCards` row.
    pub fn upsert_loc_card(&self, row: LocCardRow) {
        self.state.lock().loc_cards.insert(row.id, row);
    }

    /// Clear a row's download-pending flag, as the vendor does once the
    /// controllers have consumed it.
    pub fn mark_downloaded(&self, loc_card_id: i64) {
        if let Some(row) = self.state.lock().loc_cards.get_mut(&loc_card_id) {
            row.download_pending = false;
        }
    }

    pub fn delete_loc_card(&self, loc_card_id: i64) {
        self.state.lock().loc_cards.remove(&loc_card_id);
    }
}

impl AcsStore for FakeAcsStore {
    fn name_id_for_card(&self, card_number: i64) -> Result<Option<i64>, StoreError> {
        Ok(self.state.lock().name_ids.get(&card_number).copied())
    }

    fn access_card(&self, card_id: i64) -> Result<Option<AccessCard>, StoreError> {
        Ok(self.state.lock().cards.get(&card_id).copied())
    }

    fn locations_in_group(&self, location_group: i64) -> Result<Vec<i64>, StoreError> {
        let state = self.state.lock();
        let mut locations: Vec<i64> = state
            .locations
            .iter()
            .filter(|(_, group)| **group == location_group)
            .map(|(location, _)| *location)
            .collect();
        locations.sort_unstable();
        Ok(locations)
    }

    fn pending_loc_cards(&self, location_group: i64) -> Result<Vec<LocCardRow>, StoreError> {
        let state = self.state.lock();
        let mut rows: Vec<LocCardRow> = state
            .loc_cards
            .values()
            .filter(|row| row.download_pending)
            .filter(|row| state.locations.get(&row.location_id) == Some(&location_group))
            .copied()
            .collect();
        rows.sort_unstable_by_key(|row| row.id);
        Ok(rows)
    }

    fn loc_cards_by_ids(&self, ids: &[i64]) -> Result<Vec<LocCardRow>, StoreError> {
        let state = self.state.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.loc_cards.get(id).copied())
            .collect())
    }

    fn locations_downloading(&self) -> Result<Vec<i64>, StoreError> {
        Ok(self.state.lock().downloading.clone())
    }
}

#[derive(Default)]
struct FakeLogState {
    rows: Vec<ScanRow>,
}

/// In-memory log store. Clones share state; rows stay sorted by time.
#[derive(Clone, Default)]
pub struct FakeLogStore {
    state: Arc<Mutex<FakeLogState>>,
}

impl FakeLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event row, keeping the log ordered by time.
    pub fn append(&self, row: ScanRow) {
        let mut state = self.state.lock();
        state.rows.push(row);
        state.rows.sort_by_key(|row| row.time);
    }
}

impl LogStore for FakeLogStore {
    fn latest_scan_time(&self) -> Result<Option<NaiveDateTime>, StoreError> {
        Ok(self.state.lock().rows.last().map(|row| row.time))
    }

    fn scans_after(&self, after: Option<NaiveDateTime>) -> Result<Vec<ScanRow>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .rows
            .iter()
            .filter(|row| after.map_or(true, |after| row.time > after))
            .copied()
            .collect())
    }
}
