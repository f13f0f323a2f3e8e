// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mirage-debug status|rollback|stop` - Per-app session commands

use anyhow::Result;

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, print_status, OutputFormat};

pub async fn status(app: String, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::connect_or_start().await.map_err(ExitError::from)?;
    let status = client.app_status(&app).await.map_err(ExitError::from)?;
    print_status(format, &status)
}

/// Restore the workload's pre-debug template. The tunnel is left running.
pub async fn rollback(app: String, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::connect_or_start().await.map_err(ExitError::from)?;
    let status = client.rollback(&app).await.map_err(ExitError::from)?;
    if format == OutputFormat::Text {
        println!("Workload for '{app}' restored");
    }
    print_status(format, &status)
}

pub async fn stop(app: String, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::connect().map_err(ExitError::from)?;
    let existed = client.stop_session(&app).await.map_err(ExitError::from)?;
    let obj = serde_json::json!({ "app": &app, "stopped": existed });
    format_or_json(format, &obj, || {
        if existed {
            println!("Tunnel for '{app}' stopped");
        } else {
            println!("No tunnel running for '{app}'");
        }
    })
}
