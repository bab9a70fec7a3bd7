// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cas-engine: the worker event loop and its fleet.
//!
//! The harness layers are `queue` (shared primitives), `worker` (lifecycle),
//! `event_worker` (typed cooperative dispatch), `file_watcher` (filesystem
//! observation), and `event_loop` (pub/sub routing). The concrete fleet
//! members live under `workers`.

pub mod event_loop;
pub mod event_worker;
pub mod file_watcher;
pub mod queue;
pub mod worker;
pub mod workers;

pub use event_loop::{LoopMessage, WorkerEventLoop, WorkerToken};
pub use event_worker::{EventHandler, EventTask, EventWorker, Periodic};
pub use file_watcher::{FileEvents, FileWatcherWorker};
pub use queue::{EventQueue, Signal};
pub use worker::{EventSender, Subscription, Task, TaskContext, ThreadWorker, Worker, WorkerError};
