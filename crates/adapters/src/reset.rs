// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signed hardware-reset endpoint.
//!
//! A small board sits between the wall and the door controllers' power
//! supply; POSTing a signed token to it power-cycles the hardware. The
//! token is opaque to the endpoint client and comes from a [`TokenSigner`].

use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Command code for a power-cycle, embedded in the signed payload.
const RESET_COMMAND: i64 = 10;

#[derive(Debug, Error)]
pub enum ResetError {
    #[error("reset request failed: {0}")]
    Http(Box<ureq::Error>),
}

impl From<ureq::Error> for ResetError {
    fn from(error: ureq::Error) -> Self {
        Self::Http(Box::new(error))
    }
}

/// Produces opaque signed tokens the reset board will accept.
pub trait TokenSigner: Send + 'static {
    fn sign(&self, command: i64) -> String;
}

/// Shared-secret signer: `command.timestamp.hex(sha256(secret:command:timestamp))`.
pub struct SharedSecretSigner {
    secret: String,
}

impl SharedSecretSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn sign_at(&self, command: i64, timestamp: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(command.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(timestamp.to_string().as_bytes());
        let digest = hasher.finalize();
        format!("{command}.{timestamp}.{digest:x}")
    }
}

impl TokenSigner for SharedSecretSigner {
    fn sign(&self, command: i64) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.sign_at(command, timestamp)
    }
}

/// The reset endpoint as the sentinel worker sees it.
pub trait ResetEndpoint: Send + 'static {
    fn reset(&self) -> Result<(), ResetError>;
}

/// HTTP client for the reset board.
pub struct DsxPiClient<S: TokenSigner> {
    host: String,
    signer: S,
}

impl<S: TokenSigner> DsxPiClient<S> {
    /// `host` carries the scheme, e.g. `http://10.0.0.9`.
    pub fn new(host: impl Into<String>, signer: S) -> Self {
        Self {
            host: host.into(),
            signer,
        }
    }
}

impl<S: TokenSigner> ResetEndpoint for DsxPiClient<S> {
    fn reset(&self) -> Result<(), ResetError> {
        let token = self.signer.sign(RESET_COMMAND);
        let url = format!("{}/reset/{}", self.host, token);
        // Non-2xx statuses come back as ureq errors; the caller logs and
        // backs off.
        let response = ureq::post(&url).call()?;
        tracing::info!(status = response.status(), "hardware reset requested");
        Ok(())
    }
}

/// Counting endpoint for sentinel tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeResetEndpoint {
    resets: std::sync::Arc<parking_lot::Mutex<usize>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeResetEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resets(&self) -> usize {
        *self.resets.lock()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ResetEndpoint for FakeResetEndpoint {
    fn reset(&self) -> Result<(), ResetError> {
        *self.resets.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "reset_tests.rs"]
mod tests;
