// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access to the two legacy databases.
//!
//! The ACS store holds configuration and state (cards, people, per-location
//! mirrors); the log store is the append-only record of door events written
//! by the controllers. Workers depend on these traits only; the SQLite
//! implementations below speak the legacy table shapes directly.

mod sqlite;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use sqlite::{SqliteAcsStore, SqliteLogStore};

use cas_core::AccessCard;
use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp { value: String },
}

/// One `LocCards` row: the per-location mirror of a card. `download_pending`
/// is the vendor's flag that the row has not yet been pushed to hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocCardRow {
    pub id: i64,
    pub card_id: i64,
    pub location_id: i64,
    pub download_pending: bool,
}

/// One event-log row, normalized for the card-scan watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRow {
    pub time: NaiveDateTime,
    pub location_id: i64,
    pub event_code: i64,
    pub device: i64,
    pub card_number: i64,
    pub name_id: Option<i64>,
}

/// Session over the configuration/state database.
pub trait AcsStore: Send + 'static {
    /// Resolve the person attached to a card number.
    fn name_id_for_card(&self, card_number: i64) -> Result<Option<i64>, StoreError>;

    /// Fetch a card record by id.
    fn access_card(&self, card_id: i64) -> Result<Option<AccessCard>, StoreError>;

    /// Locations belonging to a location group.
    fn locations_in_group(&self, location_group: i64) -> Result<Vec<i64>, StoreError>;

    /// `LocCards` rows in the group still flagged for download.
    fn pending_loc_cards(&self, location_group: i64) -> Result<Vec<LocCardRow>, StoreError>;

    /// `LocCards` rows by id; ids that no longer exist are simply absent.
    fn loc_cards_by_ids(&self, ids: &[i64]) -> Result<Vec<LocCardRow>, StoreError>;

    /// Locations currently flagged as downloading to their controllers.
    fn locations_downloading(&self) -> Result<Vec<i64>, StoreError>;
}

/// Session over the append-only event-log database.
pub trait LogStore: Send + 'static {
    /// Timestamp of the newest event row, if any.
    fn latest_scan_time(&self) -> Result<Option<NaiveDateTime>, StoreError>;

    /// Event rows strictly after `after`, ascending by time. `None` returns
    /// everything.
    fn scans_after(&self, after: Option<NaiveDateTime>) -> Result<Vec<ScanRow>, StoreError>;
}
