// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watches for operator-dropped restart trigger files.
//!
//! Creating `restart` or `restart.txt` in the config root asks the server
//! to unwind; the trigger is deleted on sight so the next start does not
//! restart again.

use crate::file_watcher::{FileEvents, FileWatcherWorker};
use crate::queue::EventQueue;
use crate::worker::WorkerError;
use cas_core::WorkerEvent;
use std::path::{Path, PathBuf};

const TRIGGER_FILES: [&str; 2] = ["restart.txt", "restart"];

struct RestartTriggers;

impl FileEvents for RestartTriggers {
    fn on_created(&mut self, path: &Path, outbound: &EventQueue<WorkerEvent>) {
        tracing::info!(path = %path.display(), "restart trigger file found");
        if let Err(error) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %error, "could not remove restart trigger");
        }
        outbound.push(WorkerEvent::ApplicationRestartNeeded);
    }
}

/// Build the watcher for the restart trigger files under `config_root`.
pub fn restart_file_watcher(config_root: &Path) -> Result<FileWatcherWorker, WorkerError> {
    let triggers: Vec<PathBuf> = TRIGGER_FILES
        .iter()
        .map(|name| config_root.join(name))
        .collect();

    // A trigger left behind by a previous run would restart us the moment
    // the watch starts; clear them before watching.
    for trigger in &triggers {
        if trigger.exists() {
            tracing::info!(path = %trigger.display(), "removing stale restart trigger");
            std::fs::remove_file(trigger)?;
        }
    }

    FileWatcherWorker::new("restart-file-watcher", &triggers, RestartTriggers)
}

#[cfg(test)]
#[path = "restart_file_watcher_tests.rs"]
mod tests;
