// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin facet surface.
//!
//! Third-party plugins implement whichever facets they need; default methods
//! make every facet optional. The plugin worker only ever calls through this
//! trait and routes facet errors to [`Plugin::on_error`], so one broken
//! plugin cannot take the fleet down.

use crate::card::AccessCard;
use crate::scan::CardScan;
use std::time::Duration;

/// Error type surfaced by plugin facets.
pub type PluginError = Box<dyn std::error::Error + Send + Sync>;

pub trait Plugin: Send + 'static {
    /// Stable name used in logs and thread names.
    fn name(&self) -> &str;

    /// Called once when the plugin worker starts, before any other facet.
    fn startup(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called when the plugin worker shuts down. Best effort only.
    fn shutdown(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called for every badge scan.
    fn card_scanned(&mut self, _scan: &CardScan) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called after a card has been written down to the hardware.
    fn card_data_pushed(&mut self, _card: &AccessCard) -> Result<(), PluginError> {
        Ok(())
    }

    /// Periodic facet: return how long to wait until the next call.
    ///
    /// `None` means the plugin has no periodic work. Zero means "call again
    /// on the next loop iteration", which is roughly once a second.
    fn poll(&mut self) -> Result<Option<Duration>, PluginError> {
        Ok(None)
    }

    /// Receives errors raised by this plugin's other facets.
    fn on_error(&mut self, _error: &PluginError) {}
}
