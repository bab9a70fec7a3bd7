// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cas-daemon: configuration and wiring for the card automation server.

pub mod config;
pub mod fleet;

pub use config::{Config, ConfigError};
pub use fleet::{register_fleet, register_plugin, SetupError};
