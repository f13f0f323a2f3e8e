// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mirage-debug app` - App registry commands

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use mirage_core::{
    App, Arch, DebugToolBuilder, DebugToolSource, IdeType, LocalConfig, ProgramType, RemoteConfig,
    RemoteRuntime, WorkloadType,
};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{app_lines, format_or_json, handle_list, render_apps, OutputFormat};

#[derive(Args)]
pub struct AppArgs {
    #[command(subcommand)]
    pub command: AppCommand,
}

#[derive(Subcommand)]
pub enum AppCommand {
    /// Register an app from flags or a JSON record
    Create(CreateArgs),
    /// Show one app
    Get { name: String },
    /// List registered apps
    List,
    /// Delete an app and stop its tunnel
    Delete { name: String },
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Read the whole app record from a JSON file
    #[arg(long, conflicts_with = "name")]
    pub file: Option<PathBuf>,

    /// App name (also the default workload name)
    #[arg(required_unless_present = "file")]
    pub name: Option<String>,

    /// Program type: go or rust
    #[arg(long = "type", default_value = "go")]
    pub program_type: ProgramType,

    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Workload kind: deployment or daemonset
    #[arg(long, default_value = "deployment")]
    pub kind: WorkloadType,

    /// Workload name (defaults to the app name)
    #[arg(long)]
    pub workload: Option<String>,

    /// Container to debug (defaults to the first container)
    #[arg(long)]
    pub container: Option<String>,

    #[arg(long, default_value = "amd64")]
    pub arch: Arch,

    /// Local project directory
    #[arg(long, default_value = ".")]
    pub working_dir: PathBuf,

    /// Package or entry path handed to the build
    #[arg(long, default_value = "")]
    pub entry: String,

    /// Binary produced by the build, relative to the working dir
    #[arg(long, required_unless_present = "file")]
    pub build_output: Option<PathBuf>,

    /// Arguments passed to the debuggee
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub args: String,

    /// Replace the language's default build command
    #[arg(long)]
    pub build_command: Option<String>,

    #[arg(long, default_value = "vscode")]
    pub ide: IdeType,

    /// Where the debug tool is built: local or remote
    #[arg(long, default_value = "local")]
    pub tool_source: DebugToolSource,

    /// Debug tool build command (repeatable)
    #[arg(long = "tool-command")]
    pub tool_commands: Vec<String>,

    /// Fixed remote debugging port (random when unset)
    #[arg(long)]
    pub port: Option<u16>,

    /// Never modify the workload; debug the pod as it runs
    #[arg(long, requires = "port")]
    pub no_modify: bool,
}

pub async fn app(args: AppArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        AppCommand::Create(create) => {
            let app = match &create.file {
                Some(path) => read_app_file(path)?,
                None => app_from_args(create, &std::env::current_dir()?)?,
            };
            let client = DaemonClient::connect_or_start().await.map_err(ExitError::from)?;
            let app = client.create_app(app).await.map_err(ExitError::from)?;
            format_or_json(format, &app, || println!("App '{}' created", app.name))
        }
        AppCommand::Get { name } => {
            let client = DaemonClient::connect_or_start().await.map_err(ExitError::from)?;
            let app = client.get_app(&name).await.map_err(ExitError::from)?;
            format_or_json(format, &app, || {
                for line in app_lines(&app) {
                    println!("{line}");
                }
            })
        }
        AppCommand::List => {
            let client = DaemonClient::connect_or_start().await.map_err(ExitError::from)?;
            let apps = client.list_apps().await.map_err(ExitError::from)?;
            handle_list(format, &apps, "No apps registered.", |items, out| render_apps(items, out))
        }
        AppCommand::Delete { name } => {
            let client = DaemonClient::connect_or_start().await.map_err(ExitError::from)?;
            let app = client.delete_app(&name).await.map_err(ExitError::from)?;
            format_or_json(format, &app, || println!("App '{}' deleted", app.name))
        }
    }
}

fn read_app_file(path: &Path) -> Result<App> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Build an app record from create flags. Relative working dirs resolve against `cwd`.
pub fn app_from_args(args: CreateArgs, cwd: &Path) -> Result<App> {
    let name = args.name.ok_or_else(|| anyhow!("app name is required"))?;
    let build_output = args.build_output.ok_or_else(|| anyhow!("--build-output is required"))?;
    let working_dir =
        if args.working_dir.is_absolute() { args.working_dir } else { cwd.join(args.working_dir) };

    let runtime = RemoteRuntime {
        namespace: args.namespace,
        workload_type: args.kind,
        workload_name: args.workload.unwrap_or_else(|| name.clone()),
        container_name: args.container,
        target_arch: args.arch,
    };

    let builder = DebugToolBuilder {
        source: args.tool_source,
        build_commands: args.tool_commands,
        local_dest: None,
    };
    let mut local = LocalConfig::new(working_dir, build_output)
        .app_entry_path(args.entry)
        .app_args(args.args)
        .ide_type(args.ide)
        .debug_tool_builder(builder);
    if let Some(command) = args.build_command {
        local = local.custom_build_command(command);
    }

    let mut app = App::new(name, args.program_type, runtime).local_config(local);
    if let Some(port) = args.port {
        let mut remote = RemoteConfig::new("/tmp/debug-tool", "/tmp", port);
        remote.no_modify_config = args.no_modify;
        app = app.remote_config(remote);
    }
    Ok(app)
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
