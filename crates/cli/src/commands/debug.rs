// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mirage-debug debug` - Prepare the remote side, build locally, launch

use anyhow::{anyhow, Result};
use clap::Args;
use mirage_adapters::shell::{execute_commands, ShellOptions};
use mirage_adapters::LanguageAdaptors;
use mirage_core::App;

use crate::client::DaemonClient;
use crate::color;
use crate::exit_error::{ExitError, CONFIGURATION};
use crate::output::{print_status, OutputFormat};

#[derive(Args)]
pub struct DebugArgs {
    /// App to debug
    pub app: String,

    /// Launch the existing local binary without rebuilding
    #[arg(long)]
    pub skip_build: bool,
}

pub async fn debug(args: DebugArgs, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::connect_or_start().await.map_err(ExitError::from)?;
    let name = args.app.as_str();

    progress(format, &format!("Preparing remote environment for '{name}'..."));
    client.init_remote(name).await.map_err(ExitError::from)?;

    let app = client.get_app(name).await.map_err(ExitError::from)?;
    if !args.skip_build {
        let command = build_command(&app)?;
        progress(format, &format!("Building: {command}"));
        build_locally(&app, command).await?;
    }

    progress(format, "Launching debuggee...");
    let status = client.start_debugging(name).await.map_err(ExitError::from)?;

    if let (OutputFormat::Text, Some(remote)) = (format, &app.remote_config) {
        println!(
            "Debugger listening on {}",
            color::header(&format!("localhost:{}", remote.remote_debugging_port))
        );
    }
    print_status(format, &status)
}

/// The language's build command for this app.
pub fn build_command(app: &App) -> Result<String> {
    let adaptor = LanguageAdaptors::standard()
        .get(app.program_type)
        .map_err(|e| ExitError::new(CONFIGURATION, e.to_string()))?;
    adaptor.build_command(app).map_err(|e| ExitError::new(CONFIGURATION, e.to_string()).into())
}

/// Run the build in the app's working directory.
pub async fn build_locally(app: &App, command: String) -> Result<()> {
    let local = app
        .local_config
        .as_ref()
        .ok_or_else(|| anyhow!("app '{}' has no local config", app.name))?;
    let options = ShellOptions::new().cwd(&local.working_dir);
    execute_commands(&[command], &options).await?;

    let binary = local.binary_path();
    if !binary.exists() {
        return Err(anyhow!("build succeeded but {} was not produced", binary.display()));
    }
    Ok(())
}

fn progress(format: OutputFormat, message: &str) {
    if format == OutputFormat::Text {
        eprintln!("{}", color::muted(message));
    }
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
