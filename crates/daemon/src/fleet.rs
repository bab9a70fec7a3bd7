// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the worker fleet and registers it with the event loop.

use crate::config::Config;
use cas_adapters::{
    CommServerProcess, DsxPiClient, SharedSecretSigner, SqliteAcsStore, SqliteLogStore,
    StoreError, TcpCommServer,
};
use cas_core::{Plugin, SystemClock};
use cas_engine::workers::{
    database_file_watcher, restart_file_watcher, CardPushedWatcher, CardScanWatcher,
    CommServerSocketListener, CommServerSupervisor, DoorOverrideController, HardwareResetWorker,
    PluginWorker, UpdateCallback, UpdateCallbackBridge,
};
use cas_engine::{EventWorker, WorkerError, WorkerEventLoop};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Config {
    fn comm_server(&self) -> TcpCommServer {
        TcpCommServer::new(
            self.windsx.cs_host.clone(),
            self.windsx.cs_port,
            self.windsx.workstation_number,
        )
    }

    fn acs_store(&self) -> Result<SqliteAcsStore, StoreError> {
        SqliteAcsStore::open(&self.windsx.acs_data_db_path)
    }
}

/// Build every worker and register it with the loop.
///
/// Returns the update callback to publish to the lookup layer, so that
/// writes performed there re-enter the event bus.
pub fn register_fleet(
    event_loop: &mut WorkerEventLoop,
    config: &Config,
    config_root: &Path,
) -> Result<UpdateCallback, SetupError> {
    // When someone updates a data model through the lookup layer.
    let bridge = UpdateCallbackBridge::new();
    let callback = bridge.callback();
    event_loop.add(bridge)?;

    // When the comm server isn't running, restart it.
    let process = CommServerProcess::new(config.windsx.root.join("CS.exe"));
    event_loop.add(EventWorker::new(
        "comm-server-supervisor",
        CommServerSupervisor::new(process),
    ))?;

    // When a card can't be pushed and the hardware needs a nudge.
    let endpoint = DsxPiClient::new(
        config.dsxpi.host.clone(),
        SharedSecretSigner::new(config.dsxpi.secret.clone()),
    );
    event_loop.add(EventWorker::new(
        "dsx-hardware-reset",
        HardwareResetWorker::new(config.acs_store()?, endpoint, SystemClock),
    ))?;

    // When the databases on disk change.
    event_loop.add(database_file_watcher(
        &config.windsx.acs_data_db_path,
        &config.windsx.log_db_path,
    )?)?;

    // When an operator drops a restart trigger file.
    event_loop.add(restart_file_watcher(config_root)?)?;

    // When someone badges in.
    let log_store = SqliteLogStore::open(&config.windsx.log_db_path)?;
    event_loop.add(EventWorker::new(
        "card-scan-watcher",
        CardScanWatcher::new(config.acs_store()?, log_store)?,
    ))?;

    // When a card's data reaches the hardware.
    event_loop.add(EventWorker::new(
        "card-pushed-watcher",
        CardPushedWatcher::new(config.acs_store()?, config.windsx.location_group)?,
    ))?;

    // Allow plugins to override their doors.
    event_loop.add(EventWorker::new(
        "door-override-controller",
        DoorOverrideController::new(config.comm_server(), SystemClock),
    ))?;

    // Raw telemetry off the comm server socket.
    event_loop.add(CommServerSocketListener::new(config.comm_server()).into_worker())?;

    Ok(callback)
}

/// Register one loaded plugin instance with the loop.
///
/// Plugin discovery and code loading belong to the embedding deployment;
/// this is the seam it hands the constructed plugin through.
pub fn register_plugin<P: Plugin>(
    event_loop: &mut WorkerEventLoop,
    plugin: P,
) -> Result<(), SetupError> {
    let worker = PluginWorker::new(plugin, SystemClock);
    let name = worker.worker_name();
    event_loop.add(EventWorker::new(name, worker))?;
    Ok(())
}
