// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Card Automation Server daemon (casd)
//!
//! Long-running process that mediates between the legacy access-control
//! databases, the vendor comm server, the hardware-reset board, and loaded
//! plugins. The worker event loop owns the fleet; this binary only wires it
//! up and waits for a reason to stop.
//!
//! The process always exits non-zero so a supervising launcher does not
//! auto-restart it; restarts are requested through the event bus and
//! performed by the launcher's operator (or a fresh manual start).

use cas_daemon::config::{state_dir, Config, ConfigError};
use cas_daemon::fleet;
use cas_engine::{Signal, WorkerEventLoop};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

/// How long the fleet gets to drain and stop at shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> ExitCode {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("casd {}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            "--help" | "-h" | "help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: casd [--help | --version]");
                return ExitCode::FAILURE;
            }
        }
    }

    let config_path = match Config::locate() {
        Ok(path) => path,
        Err(error) => {
            eprintln!("casd: {error}");
            return ExitCode::FAILURE;
        }
    };
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("casd: {error}");
            return ExitCode::FAILURE;
        }
    };
    let config_root = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let _log_guard = match setup_logging() {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("casd: {error}");
            return ExitCode::FAILURE;
        }
    };

    info!(config = %config_path.display(), "starting card automation server");

    let mut event_loop = WorkerEventLoop::new();
    if let Err(error) = event_loop.start() {
        error!(error = %error, "failed to start worker event loop");
        return ExitCode::FAILURE;
    }

    // The returned update callback belongs to the lookup layer; plugins get
    // it through their setup surface.
    let _update_callback = match fleet::register_fleet(&mut event_loop, &config, &config_root) {
        Ok(callback) => callback,
        Err(error) => {
            error!(error = %error, "failed to start worker fleet");
            let _ = event_loop.stop(Some(SHUTDOWN_TIMEOUT));
            return ExitCode::FAILURE;
        }
    };

    info!("worker fleet running");

    let shutdown = Signal::new();
    if let Err(error) = spawn_signal_listener(shutdown.clone()) {
        error!(error = %error, "failed to install signal handlers");
        let _ = event_loop.stop(Some(SHUTDOWN_TIMEOUT));
        return ExitCode::FAILURE;
    }

    // Park until a signal arrives or the loop unwinds itself (restart
    // trigger, ApplicationRestartNeeded from a worker, ...).
    while event_loop.is_alive() {
        if shutdown.wait_timeout(Duration::from_secs(1)) {
            info!("shutdown signal received");
            break;
        }
    }

    if let Err(error) = event_loop.stop(Some(SHUTDOWN_TIMEOUT)) {
        error!(error = %error, "worker event loop did not stop cleanly");
    }

    info!("card automation server stopped");
    ExitCode::FAILURE
}

fn print_help() {
    println!("casd {}", env!("CARGO_PKG_VERSION"));
    println!("Card Automation Server - event loop over a legacy access-control install");
    println!();
    println!("USAGE:");
    println!("    casd");
    println!();
    println!("Configuration is read from $CASD_CONFIG, falling back to");
    println!("$XDG_CONFIG_HOME/casd/config.toml. The process exits non-zero on");
    println!("shutdown by design.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}

/// Forward SIGINT/SIGTERM into a cooperative shutdown signal.
fn spawn_signal_listener(shutdown: Signal) -> Result<(), std::io::Error> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!(signal, "received process signal");
                shutdown.set();
            }
        })?;
    Ok(())
}

/// Maximum log file size before startup rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (casd.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `casd.log` → `casd.log.1` → `casd.log.2` → `casd.log.3`, deleting
/// the oldest. Best-effort: rotation failures never block startup.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging() -> Result<tracing_appender::non_blocking::WorkerGuard, ConfigError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let state_dir = state_dir()?;
    std::fs::create_dir_all(&state_dir).map_err(|source| ConfigError::Read {
        path: state_dir.clone(),
        source,
    })?;
    let log_path = state_dir.join("casd.log");
    rotate_log_if_needed(&log_path);

    let file_appender = tracing_appender::rolling::never(&state_dir, "casd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
