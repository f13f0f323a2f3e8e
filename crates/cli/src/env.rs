// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables read by the CLI.

use std::path::PathBuf;
use std::time::Duration;

pub use mirage_daemon::env::ipc_timeout;

/// Explicit path to the `mirage-debugd` binary.
pub fn daemon_binary() -> Option<PathBuf> {
    std::env::var("MIRAGE_DAEMON_BINARY").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Response deadline for requests that wait on pods and tool builds (default 15 min).
pub fn long_request_timeout() -> Duration {
    std::env::var("MIRAGE_LONG_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(15 * 60))
}
