// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite sessions over the legacy table shapes.
//!
//! Column names follow the vendor schema: `NAMES`/`CARDS` for people and
//! cards, `LOC` for locations, `LocCards` for per-location mirrors, and
//! `EvnLog` for the event log. Card numbers are stored as REAL and
//! timestamps as `YYYY-MM-DD HH:MM:SS` text.

use super::{AcsStore, LocCardRow, LogStore, ScanRow, StoreError};
use cas_core::AccessCard;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_time(value: &str) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT).map_err(|_| StoreError::InvalidTimestamp {
        value: value.to_string(),
    })
}

pub(crate) fn format_time(value: NaiveDateTime) -> String {
    value.format(TIME_FORMAT).to_string()
}

/// Session over the configuration/state database.
pub struct SqliteAcsStore {
    conn: Connection,
}

impl SqliteAcsStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl AcsStore for SqliteAcsStore {
    fn name_id_for_card(&self, card_number: i64) -> Result<Option<i64>, StoreError> {
        let name_id = self
            .conn
            .query_row(
                "SELECT NAMES.ID FROM NAMES \
                 JOIN CARDS ON CARDS.NameID = NAMES.ID \
                 WHERE CARDS.Code = ?1",
                params![card_number as f64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name_id)
    }

    fn access_card(&self, card_id: i64) -> Result<Option<AccessCard>, StoreError> {
        let card = self
            .conn
            .query_row(
                "SELECT ID, Code FROM CARDS WHERE ID = ?1",
                params![card_id],
                |row| {
                    let code: f64 = row.get(1)?;
                    Ok(AccessCard {
                        id: row.get(0)?,
                        card_number: code as i64,
                    })
                },
            )
            .optional()?;
        Ok(card)
    }

    fn locations_in_group(&self, location_group: i64) -> Result<Vec<i64>, StoreError> {
        let mut statement = self
            .conn
            .prepare("SELECT Loc FROM LOC WHERE LocGrp = ?1")?;
        let locations = statement
            .query_map(params![location_group], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(locations)
    }

    fn pending_loc_cards(&self, location_group: i64) -> Result<Vec<LocCardRow>, StoreError> {
        let mut statement = self.conn.prepare(
            "SELECT LocCards.ID, LocCards.CardID, LocCards.Loc, LocCards.DlFlag \
             FROM LocCards \
             JOIN LOC ON LOC.Loc = LocCards.Loc \
             WHERE LOC.LocGrp = ?1 AND LocCards.DlFlag != 0",
        )?;
        let rows = statement
            .query_map(params![location_group], row_to_loc_card)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn loc_cards_by_ids(&self, ids: &[i64]) -> Result<Vec<LocCardRow>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT ID, CardID, Loc, DlFlag FROM LocCards WHERE ID IN ({placeholders})"
        );
        let mut statement = self.conn.prepare(&sql)?;
        let rows = statement
            .query_map(rusqlite::params_from_iter(ids.iter()), row_to_loc_card)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn locations_downloading(&self) -> Result<Vec<i64>, StoreError> {
        let mut statement = self
            .conn
            .prepare("SELECT Loc FROM LOC WHERE PlFlag != 0")?;
        let locations = statement
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(locations)
    }
}

fn row_to_loc_card(row: &rusqlite::Row<'_>) -> rusqlite::Result<LocCardRow> {
    let download_flag: i64 = row.get(3)?;
    Ok(LocCardRow {
        id: row.get(0)?,
        card_id: row.get(1)?,
        location_id: row.get(2)?,
        download_pending: download_flag != 0,
    })
}

/// Session over the append-only event-log database.
pub struct SqliteLogStore {
    conn: Connection,
}

impl SqliteLogStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl LogStore for SqliteLogStore {
    fn latest_scan_time(&self) -> Result<Option<NaiveDateTime>, StoreError> {
        let newest: Option<String> = self
            .conn
            .query_row("SELECT MAX(TimeDate) FROM EvnLog", [], |row| row.get(0))?;
        newest.as_deref().map(parse_time).transpose()
    }

    fn scans_after(&self, after: Option<NaiveDateTime>) -> Result<Vec<ScanRow>, StoreError> {
        let sql_base = "SELECT TimeDate, Loc, Event, Dev, Code, Opr FROM EvnLog";
        let mut rows = Vec::new();

        match after {
            Some(after) => {
                let mut statement = self
                    .conn
                    .prepare(&format!("{sql_base} WHERE TimeDate > ?1 ORDER BY TimeDate"))?;
                let mapped = statement.query_map(params![format_time(after)], scan_columns)?;
                for row in mapped {
                    rows.push(row_to_scan(row?)?);
                }
            }
            None => {
                let mut statement = self.conn.prepare(&format!("{sql_base} ORDER BY TimeDate"))?;
                let mapped = statement.query_map([], scan_columns)?;
                for row in mapped {
                    rows.push(row_to_scan(row?)?);
                }
            }
        }

        Ok(rows)
    }
}

type ScanColumns = (String, i64, i64, i64, f64, Option<String>);

fn scan_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScanColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn row_to_scan(columns: ScanColumns) -> Result<ScanRow, StoreError> {
    let (time, location_id, event_code, device, card_number, operator) = columns;
    Ok(ScanRow {
        time: parse_time(&time)?,
        location_id,
        event_code,
        device,
        card_number: card_number as i64,
        name_id: operator.and_then(|value| value.trim().parse().ok()),
    })
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
