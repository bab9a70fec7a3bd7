// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-watching worker.
//!
//! A file cannot be watched directly on every platform, so the worker
//! watches the parent directory of each supplied path and filters delivered
//! events against the registered absolute path set before invoking the
//! handler. Sibling files changing in the same directory never reach the
//! handler.

use crate::queue::EventQueue;
use crate::worker::{Worker, WorkerError};
use cas_core::WorkerEvent;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Change-kind callbacks for a file watcher.
///
/// `on_any` fires for every matching event, before the kind-specific
/// callback. Callbacks run on the observer's thread; emit events through
/// the supplied outbound queue.
pub trait FileEvents: Send + 'static {
    fn on_any(&mut self, _path: &Path, _outbound: &EventQueue<WorkerEvent>) {}
    fn on_created(&mut self, _path: &Path, _outbound: &EventQueue<WorkerEvent>) {}
    fn on_modified(&mut self, _path: &Path, _outbound: &EventQueue<WorkerEvent>) {}
}

pub struct FileWatcherWorker {
    name: String,
    directories: Vec<PathBuf>,
    watcher: Option<RecommendedWatcher>,
    outbound: Arc<EventQueue<WorkerEvent>>,
    started: bool,
}

impl FileWatcherWorker {
    /// `paths` are the files to observe; relative paths are resolved
    /// against the current directory. The files do not have to exist yet.
    pub fn new<H: FileEvents>(
        name: impl Into<String>,
        paths: &[PathBuf],
        handler: H,
    ) -> Result<Self, WorkerError> {
        let files: HashSet<PathBuf> = paths
            .iter()
            .map(std::path::absolute)
            .collect::<Result<_, _>>()?;

        let mut directories: Vec<PathBuf> = Vec::new();
        for file in &files {
            if let Some(parent) = file.parent() {
                if !directories.iter().any(|dir| dir == parent) {
                    directories.push(parent.to_path_buf());
                }
            }
        }

        let outbound = Arc::new(EventQueue::new());
        let dispatch_outbound = Arc::clone(&outbound);
        let mut handler = handler;
        let watcher = notify::recommended_watcher(
            move |result: Result<notify::Event, notify::Error>| {
                let event = match result {
                    Ok(event) => event,
                    Err(error) => {
                        tracing::warn!(error = %error, "filesystem observer error");
                        return;
                    }
                };

                // Prefer the destination path for rename-style events, which
                // list it last.
                let Some(path) = event
                    .paths
                    .iter()
                    .rev()
                    .find(|path| files.contains(path.as_path()))
                else {
                    return;
                };

                handler.on_any(path, &dispatch_outbound);
                match event.kind {
                    notify::EventKind::Create(_) => handler.on_created(path, &dispatch_outbound),
                    notify::EventKind::Modify(_) => handler.on_modified(path, &dispatch_outbound),
                    _ => {}
                }
            },
        )?;

        Ok(Self {
            name: name.into(),
            directories,
            watcher: Some(watcher),
            outbound,
            started: false,
        })
    }

    /// Directories under observation (the distinct parents of the paths).
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }
}

impl Worker for FileWatcherWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        if self.started {
            return Ok(());
        }
        let Some(watcher) = self.watcher.as_mut() else {
            return Ok(());
        };
        for directory in &self.directories {
            watcher.watch(directory, RecursiveMode::NonRecursive)?;
        }
        self.started = true;
        Ok(())
    }

    fn stop(&mut self, _timeout: Option<Duration>) -> Result<(), WorkerError> {
        // Dropping the observer stops and joins its worker threads.
        self.watcher.take();
        Ok(())
    }

    fn outbound(&self) -> Arc<EventQueue<WorkerEvent>> {
        Arc::clone(&self.outbound)
    }
}

#[cfg(test)]
#[path = "file_watcher_tests.rs"]
mod tests;
