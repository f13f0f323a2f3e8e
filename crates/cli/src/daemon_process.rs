// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locating and spawning the `mirage-debugd` binary.

use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::client::ClientError;
use crate::env;

const DAEMON_BINARY: &str = "mirage-debugd";
const STARTUP_MARKER: &str = "Starting daemon";
const FAILURE_MARKER: &str = "Startup failed: ";

/// `MIRAGE_DAEMON_BINARY`, else the binary next to this executable, else `$PATH`.
pub fn find_daemon_binary() -> PathBuf {
    if let Some(path) = env::daemon_binary() {
        return path;
    }
    let sibling = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DAEMON_BINARY)));
    match sibling {
        Some(path) if path.exists() => path,
        _ => PathBuf::from(DAEMON_BINARY),
    }
}

/// Spawn the daemon detached from this process group.
pub fn spawn_background() -> Result<(), ClientError> {
    let binary = find_daemon_binary();
    Command::new(&binary)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {e}", binary.display())))?;
    Ok(())
}

/// Run the daemon in the foreground, returning its exit status.
pub fn run_foreground() -> std::io::Result<std::process::ExitStatus> {
    Command::new(find_daemon_binary()).status()
}

/// Startup failure recorded in the daemon log, if the last start failed.
pub fn read_startup_error(log_path: &Path) -> Option<String> {
    let log = std::fs::read_to_string(log_path).ok()?;
    parse_startup_error(&log)
}

/// Find the failure reason logged after the most recent startup.
pub fn parse_startup_error(log: &str) -> Option<String> {
    let start = log.rfind(STARTUP_MARKER)?;
    log[start..].lines().find_map(|line| {
        let (_, reason) = line.split_once(FAILURE_MARKER)?;
        line.contains("ERROR").then(|| reason.trim().to_string())
    })
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
