// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control over the vendor comm server process.
//!
//! The supervisor worker owns the process through this trait: check it,
//! start it, kill it. The real implementation holds the spawned child; a
//! comm server started by someone else is out of reach and simply gets a
//! sibling, which is how the original behaves after a crash too.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("comm server process error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait ProcessControl: Send + 'static {
    fn is_running(&mut self) -> bool;
    fn start(&mut self) -> Result<(), ProcessError>;
    fn kill(&mut self) -> Result<(), ProcessError>;
}

/// The comm server as a child process.
pub struct CommServerProcess {
    executable: PathBuf,
    child: Option<Child>,
}

impl CommServerProcess {
    pub fn new(executable: PathBuf) -> Self {
        Self {
            executable,
            child: None,
        }
    }
}

impl ProcessControl for CommServerProcess {
    fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                // Exited, or we could not tell; either way, forget it.
                Ok(Some(_)) | Err(_) => {
                    self.child = None;
                    false
                }
            },
            None => false,
        }
    }

    fn start(&mut self) -> Result<(), ProcessError> {
        tracing::info!(executable = %self.executable.display(), "starting comm server");
        let child = Command::new(&self.executable)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        self.child = Some(child);
        Ok(())
    }

    fn kill(&mut self) -> Result<(), ProcessError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        tracing::info!("killing comm server");
        child.kill()?;
        // Reap so the dead process does not linger as a zombie.
        child.wait()?;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
struct FakeProcessState {
    running: bool,
    starts: usize,
    kills: usize,
}

/// Scriptable process control for supervisor tests. Clones share state so a
/// test can observe the handle it gave away.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone)]
pub struct FakeProcessControl {
    state: std::sync::Arc<parking_lot::Mutex<FakeProcessState>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeProcessControl {
    pub fn new(running: bool) -> Self {
        Self {
            state: std::sync::Arc::new(parking_lot::Mutex::new(FakeProcessState {
                running,
                starts: 0,
                kills: 0,
            })),
        }
    }

    /// Simulate the process dying behind our back.
    pub fn crash(&self) {
        self.state.lock().running = false;
    }

    pub fn starts(&self) -> usize {
        self.state.lock().starts
    }

    pub fn kills(&self) -> usize {
        self.state.lock().kills
    }

    pub fn running(&self) -> bool {
        self.state.lock().running
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ProcessControl for FakeProcessControl {
    fn is_running(&mut self) -> bool {
        self.state.lock().running
    }

    fn start(&mut self) -> Result<(), ProcessError> {
        let mut state = self.state.lock();
        state.starts += 1;
        state.running = true;
        Ok(())
    }

    fn kill(&mut self) -> Result<(), ProcessError> {
        let mut state = self.state.lock();
        state.kills += 1;
        state.running = false;
        Ok(())
    }
}
