// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use mirage_engine::OrchestratorConfig;

use crate::lifecycle::LifecycleError;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve config directory: MIRAGE_CONFIG_DIR > ~/.mirage
pub fn config_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("MIRAGE_CONFIG_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoConfigDir)?;
    Ok(home.join(".mirage"))
}

/// Explicit kubeconfig path. Unset means the usual kube inference.
pub fn kubeconfig() -> Option<PathBuf> {
    std::env::var("MIRAGE_KUBECONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Tracing filter directives (default `info`)
pub fn log_filter() -> String {
    std::env::var("MIRAGE_LOG").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "info".to_string())
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    millis("MIRAGE_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Pod wait retry interval
pub fn pod_poll_interval() -> Option<Duration> {
    millis("MIRAGE_POD_POLL_MS")
}

/// Pod wait overall deadline
pub fn pod_wait_timeout() -> Option<Duration> {
    millis("MIRAGE_POD_WAIT_MS")
}

/// Settle delay after launching the debuggee
pub fn settle_delay() -> Option<Duration> {
    millis("MIRAGE_SETTLE_MS")
}

/// Deadline for building a debug tool locally (default 5 min)
pub fn tool_build_timeout() -> Duration {
    millis("MIRAGE_TOOL_TIMEOUT_MS").unwrap_or(Duration::from_secs(300))
}

/// Orchestrator defaults with the timing overrides applied.
pub fn orchestrator_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    if let Some(interval) = pod_poll_interval() {
        config.pod_wait.interval = interval;
    }
    if let Some(timeout) = pod_wait_timeout() {
        config.pod_wait.timeout = timeout;
    }
    if let Some(settle) = settle_delay() {
        config.settle = settle;
    }
    config
}

fn millis(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.trim().parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
