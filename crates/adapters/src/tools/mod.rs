// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debug tool provisioning and the local tool cache.
//!
//! Tools are cached per version and architecture:
//!
//! ```text
//! <root>/<tool>-<version>/<artifact>-<arch>
//! ```
//!
//! A cached path is returned as-is. Otherwise the tool is produced in a
//! staging directory next to the cache entry (override commands, or the
//! tool's default [`Recipe`]) and renamed into place, so readers never see a
//! partially written binary. Population is serialized per (tool, arch).

mod delve;
mod gdbserver;

use std::path::{Path, PathBuf};
use std::time::Duration;

use mirage_core::Arch;
use thiserror::Error;

use crate::keyed_lock::KeyedLocks;
use crate::shell::{self, ShellError, ShellOptions};

pub use delve::Delve;
pub use gdbserver::GdbServer;

/// Environment variable naming the file a build recipe must produce.
pub const TOOL_DEST_ENV: &str = "MIRAGE_TOOL_DEST";
/// Environment variable carrying the target architecture (`amd64`, `arm64`).
pub const TARGET_ARCH_ENV: &str = "MIRAGE_TARGET_ARCH";

const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from provisioning a debug tool
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} is not available for {arch}")]
    UnsupportedArch { tool: &'static str, arch: Arch },
    #[error("building {tool} failed: {source}")]
    Build {
        tool: &'static str,
        #[source]
        source: ShellError,
    },
    #[error("downloading {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("recipe for {tool} did not produce {}", .path.display())]
    MissingArtifact { tool: &'static str, path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a tool is obtained when no override commands are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipe {
    /// Shell commands that write the binary to `$MIRAGE_TOOL_DEST`.
    Build(Vec<String>),
    /// A prebuilt binary.
    Download(String),
}

/// A debugger that can be installed into a container.
pub trait DebugTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn version(&self) -> &'static str;
    /// Binary file name inside the container.
    fn artifact(&self) -> &'static str;
    fn recipe(&self, arch: Arch) -> Result<Recipe, ToolError>;
}

/// Produces debug tools into a shared local cache.
#[derive(Clone)]
pub struct ToolProvisioner {
    root: PathBuf,
    locks: KeyedLocks<(&'static str, Arch)>,
    http: reqwest::Client,
    build_timeout: Duration,
}

impl ToolProvisioner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: KeyedLocks::new(),
            http: reqwest::Client::new(),
            build_timeout: DEFAULT_BUILD_TIMEOUT,
        }
    }

    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache location of `tool` for `arch`.
    pub fn cache_path(&self, tool: &dyn DebugTool, arch: Arch) -> PathBuf {
        self.root
            .join(format!("{}-{}", tool.name(), tool.version()))
            .join(format!("{}-{}", tool.artifact(), arch))
    }

    /// Return the cached tool, provisioning it first if needed.
    ///
    /// Non-empty `overrides` replace the tool's default recipe and are run
    /// verbatim; they must write `$MIRAGE_TOOL_DEST`.
    pub async fn ensure_local_tool(
        &self,
        tool: &dyn DebugTool,
        arch: Arch,
        overrides: &[String],
    ) -> Result<PathBuf, ToolError> {
        let dest = self.cache_path(tool, arch);
        if dest.exists() {
            return Ok(dest);
        }
        let recipe = if overrides.is_empty() {
            tool.recipe(arch)?
        } else {
            Recipe::Build(overrides.to_vec())
        };

        let _guard = self.locks.lock((tool.name(), arch)).await;
        if dest.exists() {
            return Ok(dest);
        }

        let parent = dest.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(parent)?;
        let staging = tempfile::Builder::new().prefix(".staging-").tempdir_in(parent)?;
        let produced = staging.path().join(tool.artifact());

        tracing::info!(tool = tool.name(), version = tool.version(), %arch, "provisioning debug tool");
        match &recipe {
            Recipe::Build(commands) => {
                let options = ShellOptions::new()
                    .cwd(staging.path())
                    .env(TOOL_DEST_ENV, produced.to_string_lossy())
                    .env(TARGET_ARCH_ENV, arch.as_str())
                    .timeout(self.build_timeout);
                shell::execute_commands(commands, &options)
                    .await
                    .map_err(|source| ToolError::Build { tool: tool.name(), source })?;
            }
            Recipe::Download(url) => self.download(url, &produced).await?,
        }

        if !produced.is_file() {
            return Err(ToolError::MissingArtifact { tool: tool.name(), path: produced });
        }
        make_executable(&produced)?;
        std::fs::rename(&produced, &dest)?;
        tracing::info!(tool = tool.name(), %arch, path = %dest.display(), "debug tool cached");
        Ok(dest)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), ToolError> {
        let wrap = |source| ToolError::Download { url: url.to_string(), source };
        let response = self.http.get(url).send().await.map_err(wrap)?;
        let bytes = response.error_for_status().map_err(wrap)?.bytes().await.map_err(wrap)?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
