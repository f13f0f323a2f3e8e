// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use clap::ValueEnum;
use mirage_core::{App, AppStatus};
use serde::Serialize;

use crate::color;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `data` as pretty JSON, or run `text_fn` for text output.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Text => {
            text_fn();
        }
    }
    Ok(())
}

/// Print a list as JSON, an empty message, or rendered text.
pub fn handle_list<T: Serialize>(
    format: OutputFormat,
    items: &[T],
    empty_msg: &str,
    render_text: impl FnOnce(&[T], &mut dyn Write),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
        }
        OutputFormat::Text if items.is_empty() => println!("{}", empty_msg),
        OutputFormat::Text => render_text(items, &mut std::io::stdout()),
    }
    Ok(())
}

/// Text lines for an app status.
pub fn status_lines(status: &AppStatus) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", color::header("App:"), status.app_name),
        format!("  configured: {}", color::flag(status.configured)),
        format!("  connected:  {}", color::flag(status.connected)),
        format!("  debugging:  {}", color::flag(status.debugging)),
    ];
    if let Some(error) = &status.error {
        lines.push(format!("  error:      {}", color::bad(error)));
    }
    lines
}

pub fn print_status(format: OutputFormat, status: &AppStatus) -> anyhow::Result<()> {
    format_or_json(format, status, || {
        for line in status_lines(status) {
            println!("{line}");
        }
    })
}

/// Text lines describing one app record.
pub fn app_lines(app: &App) -> Vec<String> {
    let runtime = &app.remote_runtime;
    let mut lines = vec![
        format!("{} {}", color::header("App:"), app.name),
        format!("  type:       {}", app.program_type),
        format!(
            "  workload:   {}/{} {}",
            runtime.namespace, runtime.workload_name, runtime.workload_type
        ),
        format!("  container:  {}", runtime.container_name.as_deref().unwrap_or("(first)")),
        format!("  arch:       {}", runtime.target_arch),
    ];
    if let Some(local) = &app.local_config {
        lines.push(format!("  working dir: {}", local.working_dir.display()));
        lines.push(format!("  binary:     {}", local.binary_path().display()));
        if let Some(builder) = &local.debug_tool_builder {
            lines.push(format!("  tool from:  {}", builder.source));
        }
    }
    match &app.remote_config {
        Some(remote) => {
            lines.push(format!("  port:       {}", remote.remote_debugging_port));
            lines.push(format!("  debug tool: {}", remote.debug_tool_path));
            if remote.no_modify_config {
                lines.push(format!("  {}", color::muted("workload is never modified")));
            }
        }
        None => lines.push(format!("  {}", color::muted("not initialized"))),
    }
    lines
}

/// Render apps as an aligned table.
pub fn render_apps(apps: &[App], out: &mut dyn Write) {
    let rows: Vec<[String; 5]> = apps
        .iter()
        .map(|app| {
            let runtime = &app.remote_runtime;
            [
                app.name.clone(),
                app.program_type.to_string(),
                runtime.namespace.clone(),
                format!("{}/{}", runtime.workload_type, runtime.workload_name),
                app.remote_config
                    .as_ref()
                    .map(|r| r.remote_debugging_port.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    let headers = ["NAME", "TYPE", "NAMESPACE", "WORKLOAD", "PORT"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: &[String]| {
        let padded: Vec<String> =
            cells.iter().zip(widths).map(|(c, w)| format!("{c:<w$}")).collect();
        padded.join("  ").trim_end().to_string()
    };
    let _ = writeln!(out, "{}", line(&headers.map(String::from)));
    for row in &rows {
        let _ = writeln!(out, "{}", line(row));
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
