// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::fs::File;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use mirage_adapters::{
    Cluster, KubeCluster, KubeTunnelDialer, LanguageAdaptors, ToolProvisioner, TunnelDialer,
};
use mirage_engine::{Orchestrator, OrchestratorDeps};
use mirage_storage::{AppRegistry, FileRegistry};
use tokio::net::UnixListener;
use tracing::info;

use crate::env;

use super::{Config, DaemonState, LifecycleError, StartupResult};

/// Start the daemon against the cluster from the ambient kubeconfig.
pub async fn startup(
    config: &Config,
) -> Result<StartupResult<KubeCluster, KubeTunnelDialer>, LifecycleError> {
    guarded(config, async {
        let lock_file = acquire_lock(config)?;
        let kubeconfig = env::kubeconfig();
        let cluster = KubeCluster::connect(kubeconfig.as_deref()).await?;
        let dialer = cluster.dialer();
        assemble(config, lock_file, cluster, dialer)
    })
    .await
}

/// Start the daemon with explicit cluster collaborators.
pub async fn startup_with<C, D>(
    config: &Config,
    cluster: C,
    dialer: D,
) -> Result<StartupResult<C, D>, LifecycleError>
where
    C: Cluster,
    D: TunnelDialer,
{
    guarded(config, async {
        let lock_file = acquire_lock(config)?;
        assemble(config, lock_file, cluster, dialer)
    })
    .await
}

/// Run startup, cleaning up partial state on failure.
async fn guarded<T>(
    config: &Config,
    inner: impl Future<Output = Result<T, LifecycleError>>,
) -> Result<T, LifecycleError> {
    match inner.await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock:
            // those files belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

fn acquire_lock(config: &Config) -> Result<File, LifecycleError> {
    // 1. Create config directory (needed for socket, lock, etc.)
    std::fs::create_dir_all(&config.config_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Use OpenOptions to avoid truncating the file before we hold the lock,
    // which would wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

fn assemble<C, D>(
    config: &Config,
    lock_file: File,
    cluster: C,
    dialer: D,
) -> Result<StartupResult<C, D>, LifecycleError>
where
    C: Cluster,
    D: TunnelDialer,
{
    // 3. Open the app registry
    let registry = FileRegistry::open(&config.config_dir)?;
    info!(apps = registry.list()?.len(), path = %config.apps_path.display(), "Loaded app registry");

    // 4. Wire the orchestrator
    std::fs::create_dir_all(&config.tools_path)?;
    let tools =
        ToolProvisioner::new(config.tools_path.clone()).with_build_timeout(env::tool_build_timeout());
    let deps = OrchestratorDeps {
        cluster,
        dialer,
        registry,
        languages: LanguageAdaptors::standard(),
        tools,
    };
    let orchestrator = Arc::new(Orchestrator::new(deps, env::orchestrator_config()));

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(socket = %config.socket_path.display(), "Daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            orchestrator,
            start_time: Instant::now(),
        },
        listener,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    // Remove socket if we created it
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }

    // Remove PID/lock file
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
