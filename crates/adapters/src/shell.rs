// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local shell execution for build steps and tool provisioning.

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use thiserror::Error;

/// Errors from running local shell commands
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to spawn {description}: {source}")]
    Spawn {
        description: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{description} exited with {}: {stderr}", fmt_code(.code))]
    Failed { description: String, code: Option<i32>, stderr: String },
    #[error("{description} timed out after {}s", .timeout.as_secs())]
    Timeout { description: String, timeout: Duration },
}

fn fmt_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

/// Working directory, extra environment, and deadline for a shell run.
#[derive(Debug, Clone, Default)]
pub struct ShellOptions {
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl ShellOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Run `commands` as one `bash` script that stops at the first failure.
///
/// Returns captured stdout on success.
pub async fn execute_commands(
    commands: &[String],
    options: &ShellOptions,
) -> Result<String, ShellError> {
    let script = format!("set -e\n{}", commands.join("\n"));
    let mut cmd = tokio::process::Command::new("bash");
    cmd.arg("-c").arg(&script).stdin(Stdio::null());
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    cmd.envs(options.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let description = summarize(commands);
    tracing::debug!(command = %description, cwd = ?options.cwd, "running shell commands");
    let output = run_with_timeout(cmd, options.timeout, &description).await?;
    if !output.status.success() {
        return Err(ShellError::Failed {
            description,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a prepared command, killing it if it outlives `timeout`.
pub async fn run_with_timeout(
    mut cmd: tokio::process::Command,
    timeout: Option<Duration>,
    description: &str,
) -> Result<Output, ShellError> {
    cmd.kill_on_drop(true);
    let spawn_err = |source| ShellError::Spawn { description: description.to_string(), source };
    match timeout {
        Some(timeout) => match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result.map_err(spawn_err),
            Err(_) => Err(ShellError::Timeout { description: description.to_string(), timeout }),
        },
        None => cmd.output().await.map_err(spawn_err),
    }
}

fn summarize(commands: &[String]) -> String {
    match commands {
        [] => "empty script".to_string(),
        [only] => format!("`{only}`"),
        [first, rest @ ..] => format!("`{first}` (+{} more)", rest.len()),
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
