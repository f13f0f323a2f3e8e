// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Where an app is in its debug lifecycle.
///
/// ```text
/// Idle → Configuring → WaitingForPod → ToolProvisioning → TunnelEstablishing → Ready → Debugging
///  ▲                                                                             │         │
///  └──────────────────────────────── rollback ──────────────────────────────────┴─────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Configuring,
    WaitingForPod,
    ToolProvisioning,
    TunnelEstablishing,
    Ready,
    Debugging,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Configuring => "configuring",
            Phase::WaitingForPod => "waiting_for_pod",
            Phase::ToolProvisioning => "tool_provisioning",
            Phase::TunnelEstablishing => "tunnel_establishing",
            Phase::Ready => "ready",
            Phase::Debugging => "debugging",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
