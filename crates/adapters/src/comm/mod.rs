// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client side of the vendor comm server's line protocol.
//!
//! The protocol is ASCII, CRLF-terminated, one request per connection. Two
//! requests exist: a door override command and an event query. Responses to
//! the query are parsed elsewhere ([`cas_core::message`]); this module only
//! moves lines.

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use cas_core::DoorState;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;
use thiserror::Error;

const IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Constant trailer of the override command. The numeric token and the
/// `11`-character length prefix come from captured vendor traffic.
const OVERRIDE_TRAILER: &str = "3830202337 11 *Comm Server";

#[derive(Debug, Error)]
pub enum CommError {
    #[error("comm server io error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected comm server response {0:?}")]
    UnexpectedResponse(String),
}

/// Per-channel resume indices for the event query. The comm server replays
/// everything after the given index on each channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCursors {
    pub a: i64,
    pub b: i64,
    pub c: i64,
    pub d: i64,
}

/// The comm server as the workers see it.
pub trait CommServer: Send + 'static {
    /// Issue a door override. Returns true when the server acknowledged.
    fn set_door_state(
        &self,
        location_id: i64,
        door_number: i64,
        state: DoorState,
    ) -> Result<bool, CommError>;

    /// Issue the event query; returns the raw response lines.
    fn fetch_events(&self, cursors: EventCursors) -> Result<Vec<String>, CommError>;
}

/// Blocking TCP client for a real comm server.
pub struct TcpCommServer {
    host: String,
    port: u16,
    workstation: i64,
}

impl TcpCommServer {
    pub fn new(host: impl Into<String>, port: u16, workstation: i64) -> Self {
        Self {
            host: host.into(),
            port,
            workstation,
        }
    }

    fn exchange(&self, request: &str) -> Result<String, CommError> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;

        stream.write_all(request.as_bytes())?;
        // Done writing; the server responds until it closes the connection.
        stream.shutdown(Shutdown::Write)?;

        let mut response = String::new();
        stream.read_to_string(&mut response)?;
        Ok(response)
    }
}

impl CommServer for TcpCommServer {
    fn set_door_state(
        &self,
        location_id: i64,
        door_number: i64,
        state: DoorState,
    ) -> Result<bool, CommError> {
        let request = format!(
            "6 {} {} {} 0 {} {}\r\n",
            self.workstation,
            location_id,
            door_number,
            state.wire_code(),
            OVERRIDE_TRAILER,
        );
        let response = self.exchange(&request)?;

        match response.as_str() {
            // An empty reply means the override was not applied; callers retry.
            "" => Ok(false),
            "\r\n" => Ok(true),
            other => Err(CommError::UnexpectedResponse(other.to_string())),
        }
    }

    fn fetch_events(&self, cursors: EventCursors) -> Result<Vec<String>, CommError> {
        let request = format!(
            "0 80 3 {} {} {} {} 0\r\n",
            cursors.a, cursors.b, cursors.c, cursors.d,
        );
        let response = self.exchange(&request)?;

        Ok(response
            .split("\r\n")
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
