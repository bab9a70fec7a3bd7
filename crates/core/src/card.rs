// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Card identities as seen by the event bus.
//!
//! An access card is the logical identity; a `LocCard` is the per-location
//! projection the vendor system maintains, one row per (card, controller
//! group). The lookup layer owns the full records; these types carry only
//! the fields events need.

/// A logical access card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessCard {
    pub id: i64,
    pub card_number: i64,
}

/// Per-location projection of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocCard {
    pub id: i64,
    pub card_id: i64,
    pub location_id: i64,
}

/// Value the lookup layer hands to the update callback after a write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardUpdate {
    Access(AccessCard),
    Loc(LocCard),
}
