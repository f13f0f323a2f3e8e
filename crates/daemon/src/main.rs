// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mirage-debugd`: the per-user remote debug daemon.

use std::sync::Arc;

use mirage_daemon::env;
use mirage_daemon::lifecycle::{self, Config, LifecycleError, StartupResult};
use mirage_daemon::listener::{ListenCtx, Listener};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("mirage-debugd: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), LifecycleError> {
    let config = Config::load()?;
    std::fs::create_dir_all(&config.config_dir)?;

    // Log to file; the daemon runs detached from any terminal
    let appender = tracing_appender::rolling::never(&config.config_dir, "daemon.log");
    let (writer, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env::log_filter()))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    info!(version = env::PROTOCOL_VERSION, dir = %config.config_dir.display(), "Starting daemon");

    let StartupResult { mut daemon, listener } = match lifecycle::startup(&config).await {
        Ok(result) => result,
        Err(e) => {
            error!("Startup failed: {e}");
            return Err(e);
        }
    };

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        orchestrator: Arc::clone(&daemon.orchestrator),
        shutdown: Arc::clone(&shutdown),
        start_time: daemon.start_time,
    });
    tokio::spawn(Listener::new(listener, ctx).run());

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = shutdown.notified() => info!("Shutdown requested"),
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }

    daemon.shutdown().await
}
