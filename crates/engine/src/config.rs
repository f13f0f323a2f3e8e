// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::ops::Range;
use std::time::Duration;

use mirage_adapters::kube::pods::PodWait;
use mirage_adapters::ForwardBackoff;

/// Remote conventions and timings used by the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Debug tool location inside the container for newly initialized apps.
    pub remote_tool_path: String,
    /// Directory inside the container that receives the debuggee.
    pub remote_app_location: String,
    /// Ports a new app's remote debugging port is drawn from.
    pub port_range: Range<u16>,
    pub pod_wait: PodWait,
    /// How long a freshly launched debuggee must survive before we return.
    pub settle: Duration,
    pub forward_backoff: ForwardBackoff,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            remote_tool_path: "/tmp/debug-tool".to_string(),
            remote_app_location: "/tmp".to_string(),
            port_range: 50000..60000,
            pod_wait: PodWait::default(),
            settle: Duration::from_secs(3),
            forward_backoff: ForwardBackoff::default(),
        }
    }
}
