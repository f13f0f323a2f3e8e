// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

mod startup;
pub use startup::{startup, startup_with};

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use mirage_adapters::{Cluster, KubeCluster, KubeError, KubeTunnelDialer, TunnelDialer};
use mirage_engine::Orchestrator;
use mirage_storage::{FileRegistry, RegistryError};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::env::config_dir;

/// Orchestrator as the daemon runs it: file-backed registry, given cluster.
pub type DaemonOrchestrator<C = KubeCluster, D = KubeTunnelDialer> = Orchestrator<C, D, FileRegistry>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root config directory (e.g. ~/.mirage)
    pub config_dir: PathBuf,
    /// Directory of app records
    pub apps_path: PathBuf,
    /// Local debug tool cache
    pub tools_path: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::at(config_dir()?))
    }

    /// Layout rooted at `config_dir`.
    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Self {
            apps_path: config_dir.join("apps"),
            tools_path: config_dir.join("debug-tools"),
            socket_path: config_dir.join("daemon.sock"),
            lock_path: config_dir.join("daemon.pid"),
            log_path: config_dir.join("daemon.log"),
            config_dir,
        }
    }
}

/// Daemon state during operation.
pub struct DaemonState<C = KubeCluster, D: TunnelDialer = KubeTunnelDialer> {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub orchestrator: Arc<DaemonOrchestrator<C, D>>,
    pub start_time: Instant,
}

/// Result of daemon startup: the daemon state and the socket to listen on.
pub struct StartupResult<C = KubeCluster, D: TunnelDialer = KubeTunnelDialer> {
    pub daemon: DaemonState<C, D>,
    pub listener: UnixListener,
}

impl<C, D: TunnelDialer> DaemonState<C, D>
where
    C: Cluster,
{
    /// Shutdown the daemon gracefully.
    ///
    /// Every tunnel is stopped so local ports are released. Remote debuggees
    /// and debug-shaped workloads are left as they are.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Stop port-forward supervisors
        self.orchestrator.shutdown().await;

        // 2. Remove socket file (listener task stops when tokio runtime exits)
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        // 3. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 4. Lock file is released automatically when self.lock_file is dropped

        info!(uptime_secs = self.start_time.elapsed().as_secs(), "Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Cluster error: {0}")]
    Cluster(#[from] KubeError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
