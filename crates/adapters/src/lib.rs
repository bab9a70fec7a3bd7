// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cas-adapters: bridges to the world outside the worker fleet.
//!
//! The legacy access-control databases, the vendor comm server's TCP
//! protocol, the comm server process itself, and the hardware-reset HTTP
//! endpoint all live behind traits here so workers stay testable against
//! fakes.

pub mod comm;
pub mod process;
pub mod reset;
pub mod store;

pub use comm::{CommError, CommServer, EventCursors, TcpCommServer};
pub use process::{CommServerProcess, ProcessControl, ProcessError};
pub use reset::{DsxPiClient, ResetEndpoint, ResetError, SharedSecretSigner, TokenSigner};
pub use store::{AcsStore, LocCardRow, LogStore, ScanRow, SqliteAcsStore, SqliteLogStore, StoreError};

#[cfg(any(test, feature = "test-support"))]
pub use comm::fake::{DoorCommand, FakeCommServer};
#[cfg(any(test, feature = "test-support"))]
pub use process::FakeProcessControl;
#[cfg(any(test, feature = "test-support"))]
pub use reset::FakeResetEndpoint;
#[cfg(any(test, feature = "test-support"))]
pub use store::fake::{FakeAcsStore, FakeLogStore};
