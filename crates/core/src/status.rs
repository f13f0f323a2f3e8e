// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status contract returned to callers of the orchestrator.

use serde::{Deserialize, Serialize};

/// Point-in-time debug status of one app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStatus {
    pub app_name: String,
    /// Workload template carries the debug label for this app.
    pub configured: bool,
    /// A tunnel to the remote debugging port is forwarding.
    pub connected: bool,
    /// A debuggee was launched under the debug tool.
    pub debugging: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppStatus {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self { app_name: app_name.into(), ..Default::default() }
    }

    crate::setters! {
        set {
            configured: bool,
            connected: bool,
            debugging: bool,
        }
        option {
            error: String,
        }
    }
}
