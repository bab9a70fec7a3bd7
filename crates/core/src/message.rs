// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line protocol of the vendor comm server.
//!
//! Every response line has the shape `"<int>+ [*<text>]"`: whitespace
//! separated integers, optionally followed by one free-form string after the
//! first `*`. The star can appear again inside the text; only the first one
//! splits the line.

use crate::scan::CommServerEventKind;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use thiserror::Error;

/// Message type code for event lines.
const MESSAGE_TYPE_EVENT: i64 = 1;

// Field indices within an event line.
const FIELD_LOCATION: usize = 2;
const FIELD_DEVICE: usize = 3;
const FIELD_EVENT_KIND: usize = 6;
const FIELD_TIMESTAMP: usize = 10; // year, month, day, hour, minute, second
const FIELD_CARD_NUMBER: usize = 21;

/// Raised at the parser boundary for empty or malformed lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageParseError {
    #[error("cannot parse empty packet")]
    Empty,
    #[error("packet has no numeric fields")]
    NoNumericData,
    #[error("invalid integer field {0:?}")]
    InvalidInteger(String),
}

/// One parsed field of a comm server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Int(i64),
    Text(String),
}

impl Field {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Field::Int(value) => Some(*value),
            Field::Text(_) => None,
        }
    }
}

/// Outer frame of a comm server response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommServerMessage {
    data: Vec<Field>,
}

impl RawCommServerMessage {
    pub fn parse(packet: &str) -> Result<Self, MessageParseError> {
        let packet = packet.trim();
        if packet.is_empty() {
            return Err(MessageParseError::Empty);
        }

        let (left, right) = match packet.split_once('*') {
            Some((left, right)) => (left.trim_matches(' '), Some(right.trim_matches(' '))),
            None => (packet, None),
        };

        if left.is_empty() {
            return Err(MessageParseError::NoNumericData);
        }

        let mut data = Vec::new();
        for token in left.split_whitespace() {
            let value = token
                .parse::<i64>()
                .map_err(|_| MessageParseError::InvalidInteger(token.to_string()))?;
            data.push(Field::Int(value));
        }

        if let Some(text) = right {
            data.push(Field::Text(text.to_string()));
        }

        Ok(Self { data })
    }

    pub fn data(&self) -> &[Field] {
        &self.data
    }

    /// First integer of the line. Parsing guarantees at least one.
    pub fn message_type(&self) -> i64 {
        self.data.first().and_then(Field::as_int).unwrap_or_default()
    }

    pub fn is_event(&self) -> bool {
        self.message_type() == MESSAGE_TYPE_EVENT
    }

    /// Inner telemetry packet, when this line is an event.
    pub fn event(&self) -> Option<RawCommServerEvent> {
        self.is_event()
            .then(|| RawCommServerEvent::new(self.data.clone()))
    }
}

impl fmt::Display for RawCommServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for field in &self.data {
            match field {
                Field::Int(value) => {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{value}")?;
                }
                Field::Text(text) => write!(f, " *{text}")?,
            }
            first = false;
        }
        Ok(())
    }
}

/// Parsed vendor telemetry packet (message type 1).
///
/// Field accessors return `None` on short packets; workers skip those rather
/// than crash on truncated telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommServerEvent {
    data: Vec<Field>,
}

impl RawCommServerEvent {
    pub fn new(data: Vec<Field>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[Field] {
        &self.data
    }

    fn int_at(&self, index: usize) -> Option<i64> {
        self.data.get(index).and_then(Field::as_int)
    }

    /// Event timestamp composed from the six date/time fields.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let year = i32::try_from(self.int_at(FIELD_TIMESTAMP)?).ok()?;
        let month = u32::try_from(self.int_at(FIELD_TIMESTAMP + 1)?).ok()?;
        let day = u32::try_from(self.int_at(FIELD_TIMESTAMP + 2)?).ok()?;
        let hour = u32::try_from(self.int_at(FIELD_TIMESTAMP + 3)?).ok()?;
        let minute = u32::try_from(self.int_at(FIELD_TIMESTAMP + 4)?).ok()?;
        let second = u32::try_from(self.int_at(FIELD_TIMESTAMP + 5)?).ok()?;

        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
    }

    pub fn event_code(&self) -> Option<i64> {
        self.int_at(FIELD_EVENT_KIND)
    }

    /// Event kind, when the code is part of the known vocabulary.
    pub fn event_kind(&self) -> Option<CommServerEventKind> {
        CommServerEventKind::try_from(self.event_code()?).ok()
    }

    pub fn location_id(&self) -> Option<i64> {
        self.int_at(FIELD_LOCATION)
    }

    pub fn device(&self) -> Option<i64> {
        self.int_at(FIELD_DEVICE)
    }

    pub fn card_number(&self) -> Option<i64> {
        self.int_at(FIELD_CARD_NUMBER)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
