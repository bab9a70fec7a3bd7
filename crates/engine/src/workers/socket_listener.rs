// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polls the comm server's event query and feeds the raw lines into the
//! bus.
//!
//! Not an event worker: it consumes nothing and runs its own tight poll
//! loop. Each response line advances a per-channel cursor so the next
//! query resumes where the last one stopped. Until the first empty
//! response, the listener is replaying backlog that the log store has
//! already reported, so emission is suppressed.

use crate::worker::{Task, TaskContext, ThreadWorker};
use cas_adapters::comm::{CommServer, EventCursors};
use cas_core::{RawCommServerMessage, WorkerEvent};
use std::time::Duration;

/// Tight cadence so fresh events surface fast.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct CommServerSocketListener<S> {
    server: S,
    cursors: EventCursors,
    caught_up: bool,
}

impl<S: CommServer> CommServerSocketListener<S> {
    pub fn new(server: S) -> Self {
        Self {
            server,
            cursors: EventCursors::default(),
            caught_up: false,
        }
    }

    /// Wrap into the threaded harness under the listener's fleet name.
    pub fn into_worker(self) -> ThreadWorker<Self> {
        ThreadWorker::new("comm-server-socket-listener", self)
    }

    fn poll_once(&mut self, ctx: &TaskContext) {
        let lines = match self.server.fetch_events(self.cursors) {
            Ok(lines) => lines,
            Err(error) => {
                tracing::warn!(error = %error, "comm server event query failed");
                return;
            }
        };

        for line in &lines {
            tracing::debug!(target: "cs_raw", line = line.as_str(), "received");
            self.advance_cursors(line);
        }

        if !self.caught_up {
            if lines.is_empty() {
                self.caught_up = true;
                tracing::info!("comm server socket caught up");
            }
            return;
        }

        for line in &lines {
            let message = match RawCommServerMessage::parse(line) {
                Ok(message) => message,
                Err(error) => {
                    tracing::warn!(line = line.as_str(), error = %error, "unparseable comm server line");
                    continue;
                }
            };
            let event = message.event();
            ctx.emit(WorkerEvent::RawCommServerMessage(message));
            if let Some(event) = event {
                ctx.emit(WorkerEvent::RawCommServerEvent(event));
            }
        }
    }

    /// Each line starts with `<channel> <index>`; remember the index so the
    /// next query resumes after it.
    fn advance_cursors(&mut self, line: &str) {
        let mut fields = line.split_whitespace();
        let channel: Option<i64> = fields.next().and_then(|value| value.parse().ok());
        let index: Option<i64> = fields.next().and_then(|value| value.parse().ok());
        let (Some(channel), Some(index)) = (channel, index) else {
            return;
        };
        match channel {
            1 => self.cursors.a = index,
            2 => self.cursors.b = index,
            3 | 4 | 5 => self.cursors.c = index,
            8 => self.cursors.d = index,
            10 => {} // No resumable index on this channel.
            other => tracing::warn!(channel = other, index, "unknown comm server channel"),
        }
    }
}

impl<S: CommServer> Task for CommServerSocketListener<S> {
    type Message = WorkerEvent;

    fn run(&mut self, ctx: &TaskContext) {
        while !ctx.should_stop() {
            self.poll_once(ctx);
            if ctx.wait_for_stop(POLL_INTERVAL) {
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "socket_listener_tests.rs"]
mod tests;
