// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keeps the vendor comm server process alive.
//!
//! The comm server owns the serial/TCP link to the physical controllers;
//! nothing works without it. The supervisor restarts it on request and
//! re-checks its liveness once a minute.

use crate::event_worker::{EventHandler, Periodic};
use crate::worker::TaskContext;
use cas_adapters::process::ProcessControl;
use cas_core::{EventKind, WorkerEvent};
use std::convert::Infallible;
use std::time::Duration;

const CHECK_PERIOD: Duration = Duration::from_secs(60);

pub struct CommServerSupervisor<P> {
    process: P,
}

impl<P: ProcessControl> CommServerSupervisor<P> {
    pub fn new(process: P) -> Self {
        Self { process }
    }

    fn ensure_running(&mut self, _ctx: &TaskContext) {
        if self.process.is_running() {
            return;
        }
        tracing::warn!("comm server is not running");
        if let Err(error) = self.process.start() {
            tracing::error!(error = %error, "failed to start comm server");
        }
    }

    fn restart(&mut self) {
        if let Err(error) = self.process.kill() {
            tracing::warn!(error = %error, "failed to kill comm server");
        }
        if let Err(error) = self.process.start() {
            tracing::error!(error = %error, "failed to start comm server");
        }
    }
}

impl<P: ProcessControl> EventHandler for CommServerSupervisor<P> {
    type Event = WorkerEvent;
    type Error = Infallible;
    const CONSUMES: &'static [EventKind] = &[EventKind::CommServerRestartRequested];

    fn handle_event(&mut self, _ctx: &TaskContext, event: WorkerEvent) -> Result<(), Infallible> {
        if matches!(event, WorkerEvent::CommServerRestartRequested) {
            tracing::info!("restarting comm server on request");
            self.restart();
        }
        Ok(())
    }

    fn periodics() -> Vec<Periodic<Self>> {
        vec![Periodic::new(CHECK_PERIOD, Self::ensure_running)]
    }
}

#[cfg(test)]
#[path = "comm_supervisor_tests.rs"]
mod tests;
