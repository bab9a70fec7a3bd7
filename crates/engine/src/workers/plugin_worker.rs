// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one third-party plugin inside the fleet.
//!
//! Every facet call is wrapped: a failing plugin is reported to its own
//! `on_error` facet and logged, and the worker keeps running. The `poll`
//! facet gets a cooperative periodic slot driven by a monotonic deadline,
//! so plugins never manage threads of their own.

use crate::event_worker::EventHandler;
use crate::worker::TaskContext;
use cas_core::{Clock, EventKind, Plugin, PluginError, WorkerEvent};
use std::convert::Infallible;
use std::time::Instant;

pub struct PluginWorker<P, C> {
    plugin: P,
    clock: C,
    next_poll: Option<Instant>,
}

impl<P: Plugin, C: Clock> PluginWorker<P, C> {
    pub fn new(plugin: P, clock: C) -> Self {
        Self {
            plugin,
            clock,
            next_poll: None,
        }
    }

    /// Name for the worker thread, derived from the plugin.
    pub fn worker_name(&self) -> String {
        format!("plugin-{}", self.plugin.name())
    }

    fn guard(&mut self, result: Result<(), PluginError>, facet: &str) {
        let Err(error) = result else {
            return;
        };
        tracing::error!(plugin = self.plugin.name(), facet, error = %error, "plugin facet failed");
        self.plugin.on_error(&error);
    }
}

impl<P: Plugin, C: Clock> EventHandler for PluginWorker<P, C> {
    type Event = WorkerEvent;
    type Error = Infallible;
    const CONSUMES: &'static [EventKind] =
        &[EventKind::CardScanned, EventKind::AccessCardPushed];

    fn handle_event(&mut self, _ctx: &TaskContext, event: WorkerEvent) -> Result<(), Infallible> {
        match event {
            WorkerEvent::CardScanned { scan } => {
                let result = self.plugin.card_scanned(&scan);
                self.guard(result, "card_scanned");
            }
            WorkerEvent::AccessCardPushed { card } => {
                let result = self.plugin.card_data_pushed(&card);
                self.guard(result, "card_data_pushed");
            }
            _ => {}
        }
        Ok(())
    }

    fn pre_run(&mut self, _ctx: &TaskContext) {
        let result = self.plugin.startup();
        self.guard(result, "startup");
    }

    fn post_run(&mut self, _ctx: &TaskContext) {
        let result = self.plugin.shutdown();
        self.guard(result, "shutdown");
    }

    fn post_event(&mut self, _ctx: &TaskContext) {
        let now = self.clock.now();
        if self.next_poll.map_or(false, |due| now < due) {
            return;
        }
        match self.plugin.poll() {
            Ok(Some(wait)) => self.next_poll = Some(now + wait),
            Ok(None) => self.next_poll = None,
            Err(error) => {
                tracing::error!(plugin = self.plugin.name(), error = %error, "plugin loop failed");
                self.plugin.on_error(&error);
                self.next_poll = None;
            }
        }
    }
}

#[cfg(test)]
#[path = "plugin_worker_tests.rs"]
mod tests;
