// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mirage_core::App;
use serde::{Deserialize, Serialize};

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Register a new app
    CreateApp { app: App },

    GetApp { name: String },

    /// Replace a stored app record
    UpdateApp { app: App },

    /// Delete an app and stop its tunnel
    DeleteApp { name: String },

    ListApps,

    AppStatus { name: String },

    /// Debug-shape the workload, install the debug tool, open the tunnel
    InitRemote { name: String },

    /// Copy the built debuggee in and launch it under the debug tool
    StartDebugging { name: String },

    /// Restore the workload's pre-debug pod template
    Rollback { name: String },

    /// Stop an app's tunnel
    StopSession { name: String },

    /// Request daemon shutdown
    Shutdown,
}

impl Request {
    /// Requests that may run for minutes (pod waits, tool builds).
    pub fn is_long_running(&self) -> bool {
        matches!(self, Request::InitRemote { .. } | Request::StartDebugging { .. })
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
