// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mirage-debug daemon` - Daemon management commands

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::daemon_process;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

const STOP_WAIT: Duration = Duration::from_secs(5);
const STOP_POLL: Duration = Duration::from_millis(50);

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (foreground or background)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon, closing every tunnel
    Stop,
    /// Check daemon status
    Status,
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Start { foreground } => start(foreground).await,
        DaemonCommand::Stop => stop(format).await,
        DaemonCommand::Status => status(format).await,
    }
}

async fn start(foreground: bool) -> Result<()> {
    if foreground {
        let status = daemon_process::run_foreground()?;
        if !status.success() {
            return Err(anyhow!("Daemon exited with status: {}", status));
        }
        return Ok(());
    }

    if let Ok(client) = DaemonClient::connect() {
        if client.ping().await.is_ok() {
            println!("Daemon already running");
            return Ok(());
        }
    }

    DaemonClient::connect_or_start().await.map_err(ExitError::from)?;
    println!("Daemon started");
    Ok(())
}

async fn stop(format: OutputFormat) -> Result<()> {
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(ExitError::from(e).into()),
    };
    match client.shutdown().await {
        Ok(()) => {}
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(ExitError::from(e).into()),
    }

    // The daemon removes its socket as the last shutdown step
    let deadline = tokio::time::Instant::now() + STOP_WAIT;
    while client.socket_path().exists() {
        if tokio::time::Instant::now() >= deadline {
            return Err(anyhow!("Daemon did not exit within {}s", STOP_WAIT.as_secs()));
        }
        tokio::time::sleep(STOP_POLL).await;
    }

    let obj = serde_json::json!({ "status": "stopped" });
    format_or_json(format, &obj, || println!("Daemon stopped"))
}

async fn status(format: OutputFormat) -> Result<()> {
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(_) => return print_not_running(format),
    };
    let version = match client.hello().await {
        Ok(v) => v,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(ExitError::from(e).into()),
    };
    let apps = client.list_apps().await.map_err(ExitError::from)?;

    let obj = serde_json::json!({
        "status": "running",
        "version": version,
        "socket": client.socket_path(),
        "apps": apps.len(),
    });
    format_or_json(format, &obj, || {
        println!("Status: running");
        println!("Version: {}", version);
        println!("Socket: {}", client.socket_path().display());
        println!("Apps: {}", apps.len());
    })
}

fn print_not_running(format: OutputFormat) -> Result<()> {
    let obj = serde_json::json!({ "status": "not_running" });
    format_or_json(format, &obj, || println!("Daemon not running"))
}
