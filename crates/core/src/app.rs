// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App record: the root aggregate for one debuggable workload.
//!
//! ```text
//! App (name)
//!  ├── remote_runtime   where the workload lives (namespace, workload, container, arch)
//!  ├── local_config     how to build the debuggee locally
//!  └── remote_config    created on first remote init (tool path, port, template snapshot)
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Language of the debuggee; selects the language adaptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramType {
    Go,
    Rust,
}

crate::string_enum! {
    ProgramType {
        Go => "go" | "golang",
        Rust => "rust",
    }
}

/// Kind of workload that owns the pod template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadType {
    Deployment,
    #[serde(alias = "daemon_set")]
    DaemonSet,
}

crate::string_enum! {
    WorkloadType {
        Deployment => "deployment" | "deploy",
        DaemonSet => "daemonset" | "ds",
    }
}

/// Target CPU architecture of the remote container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[default]
    Amd64,
    Arm64,
}

crate::string_enum! {
    Arch {
        Amd64 => "amd64" | "x86_64",
        Arm64 => "arm64" | "aarch64",
    }
}

impl Arch {
    /// CPU component of a Rust target triple (`x86_64`, `aarch64`).
    pub fn cpu(&self) -> &'static str {
        match self {
            Arch::Amd64 => "x86_64",
            Arch::Arm64 => "aarch64",
        }
    }
}

/// IDE the developer attaches from. Stored only; project rendering is external.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeType {
    #[default]
    VsCode,
    JetBrains,
}

crate::string_enum! {
    IdeType {
        VsCode => "vscode" | "code",
        JetBrains => "jetbrains" | "goland" | "clion",
    }
}

/// Where the debug tool binary is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugToolSource {
    /// Provisioned on the developer machine, then copied into the pod.
    #[default]
    Local,
    /// Build commands run inside the container itself.
    Remote,
}

crate::string_enum! {
    DebugToolSource {
        Local => "local",
        Remote => "remote",
    }
}

/// Cluster-side location of the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRuntime {
    pub namespace: String,
    pub workload_type: WorkloadType,
    pub workload_name: String,
    /// Unset means "first container of the template"; filled in on first init.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default)]
    pub target_arch: Arch,
}

/// How the debug tool is obtained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugToolBuilder {
    #[serde(rename = "type", default)]
    pub source: DebugToolSource,
    /// Overrides the default acquisition recipe when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_commands: Vec<String>,
    /// Resolved local cache path, recorded after provisioning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_dest: Option<PathBuf>,
}

/// Developer-machine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConfig {
    pub working_dir: PathBuf,
    #[serde(default)]
    pub app_entry_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_build_command: Option<String>,
    /// Local binary produced by the build; relative paths resolve against `working_dir`.
    pub build_output: PathBuf,
    #[serde(default)]
    pub app_args: String,
    #[serde(default)]
    pub ide_type: IdeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_tool_builder: Option<DebugToolBuilder>,
}

impl LocalConfig {
    pub fn new(working_dir: impl Into<PathBuf>, build_output: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            app_entry_path: String::new(),
            custom_build_command: None,
            build_output: build_output.into(),
            app_args: String::new(),
            ide_type: IdeType::default(),
            debug_tool_builder: Some(DebugToolBuilder::default()),
        }
    }

    crate::setters! {
        into {
            app_entry_path: String,
            app_args: String,
        }
        set {
            ide_type: IdeType,
        }
        option {
            custom_build_command: String,
            debug_tool_builder: DebugToolBuilder,
        }
    }

    /// Absolute path of the built binary.
    pub fn binary_path(&self) -> PathBuf {
        if self.build_output.is_absolute() {
            self.build_output.clone()
        } else {
            self.working_dir.join(&self.build_output)
        }
    }

    /// Base name the binary keeps once copied into the container.
    pub fn binary_name(&self) -> String {
        file_name(&self.build_output)
    }
}

/// Cluster-side debugging state, created lazily on first remote init.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Absolute path of the debug tool inside the container.
    pub debug_tool_path: String,
    /// Directory inside the container that receives the debuggee.
    pub remote_app_location: String,
    pub remote_debugging_port: u16,
    /// Serialized pod template captured before the first debug-shape mutation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub initial_config: String,
    /// Never mutate the workload; debug the pod as it already runs.
    #[serde(default)]
    pub no_modify_config: bool,
}

impl RemoteConfig {
    pub fn new(
        debug_tool_path: impl Into<String>,
        remote_app_location: impl Into<String>,
        remote_debugging_port: u16,
    ) -> Self {
        Self {
            debug_tool_path: debug_tool_path.into(),
            remote_app_location: remote_app_location.into(),
            remote_debugging_port,
            initial_config: String::new(),
            no_modify_config: false,
        }
    }

    pub fn has_snapshot(&self) -> bool {
        !self.initial_config.is_empty()
    }

    /// Directory component of [`Self::debug_tool_path`] (`/` for top-level paths).
    pub fn debug_tool_dir(&self) -> &str {
        match self.debug_tool_path.rsplit_once('/') {
            Some(("", _)) | None => "/",
            Some((dir, _)) => dir,
        }
    }

    /// File name component of [`Self::debug_tool_path`].
    pub fn debug_tool_name(&self) -> &str {
        match self.debug_tool_path.rsplit_once('/') {
            Some((_, name)) => name,
            None => &self.debug_tool_path,
        }
    }

    /// Path of the debuggee inside the container.
    pub fn remote_binary(&self, binary_name: &str) -> String {
        format!("{}/{}", self.remote_app_location.trim_end_matches('/'), binary_name)
    }
}

/// A debuggable application, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub name: String,
    pub program_type: ProgramType,
    pub remote_runtime: RemoteRuntime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_config: Option<LocalConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_config: Option<RemoteConfig>,
}

impl App {
    pub fn new(
        name: impl Into<String>,
        program_type: ProgramType,
        remote_runtime: RemoteRuntime,
    ) -> Self {
        Self {
            name: name.into(),
            program_type,
            remote_runtime,
            local_config: None,
            remote_config: None,
        }
    }

    crate::setters! {
        option {
            local_config: LocalConfig,
            remote_config: RemoteConfig,
        }
    }

    /// Remote path of the debuggee, once both halves of the config exist.
    pub fn remote_binary(&self) -> Option<String> {
        let local = self.local_config.as_ref()?;
        let remote = self.remote_config.as_ref()?;
        Some(remote.remote_binary(&local.binary_name()))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
