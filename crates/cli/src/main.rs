// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mirage-debug`: debug Go and Rust workloads running in Kubernetes pods.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod client_queries;
mod color;
mod commands;
mod daemon_process;
mod env;
mod exit_error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{app, daemon, debug, session};
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "mirage-debug",
    version,
    about = "Debug Go and Rust workloads inside Kubernetes pods",
    styles = color::styles()
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage registered apps
    App(app::AppArgs),
    /// Prepare the workload, build locally, and launch under the debugger
    Debug(debug::DebugArgs),
    /// Show an app's debug status
    Status { app: String },
    /// Restore an app's workload to its pre-debug template
    Rollback { app: String },
    /// Stop an app's port-forward tunnel
    Stop { app: String },
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_error::code_for(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.output;
    match cli.command {
        Commands::App(args) => app::app(args, format).await,
        Commands::Debug(args) => debug::debug(args, format).await,
        Commands::Status { app } => session::status(app, format).await,
        Commands::Rollback { app } => session::rollback(app, format).await,
        Commands::Stop { app } => session::stop(app, format).await,
        Commands::Daemon(args) => daemon::daemon(args, format).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
