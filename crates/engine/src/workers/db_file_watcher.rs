// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watches the two legacy database files on disk.
//!
//! The vendor writes both stores in place, so a modification to either file
//! is the signal that its contents changed. Creation events are ignored:
//! the databases exist for the lifetime of the installation.

use crate::file_watcher::{FileEvents, FileWatcherWorker};
use crate::queue::EventQueue;
use crate::worker::WorkerError;
use cas_core::WorkerEvent;
use std::path::{Path, PathBuf};

struct DatabaseFiles {
    acs_db_path: PathBuf,
    log_db_path: PathBuf,
}

impl FileEvents for DatabaseFiles {
    fn on_modified(&mut self, path: &Path, outbound: &EventQueue<WorkerEvent>) {
        if path == self.acs_db_path {
            outbound.push(WorkerEvent::AcsDatabaseUpdated);
        }
        if path == self.log_db_path {
            outbound.push(WorkerEvent::LogDatabaseUpdated);
        }
    }
}

/// Build the watcher for the ACS store and the log store.
pub fn database_file_watcher(
    acs_db_path: &Path,
    log_db_path: &Path,
) -> Result<FileWatcherWorker, WorkerError> {
    let acs_db_path = std::path::absolute(acs_db_path)?;
    let log_db_path = std::path::absolute(log_db_path)?;
    let paths = [acs_db_path.clone(), log_db_path.clone()];

    FileWatcherWorker::new(
        "database-file-watcher",
        &paths,
        DatabaseFiles {
            acs_db_path,
            log_db_path,
        },
    )
}

#[cfg(test)]
#[path = "db_file_watcher_tests.rs"]
mod tests;
