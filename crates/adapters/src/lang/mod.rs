// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Language adaptors: one per program type.
//!
//! An adaptor knows how to build the debuggee locally, how to launch it
//! under its debugger in the container, and which debug tool it needs.

mod golang;
mod rust;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use mirage_core::{App, LocalConfig, ProgramType, RemoteConfig};
use thiserror::Error;

use crate::tools::{DebugTool, Recipe, ToolError, ToolProvisioner};

pub use golang::GoAdaptor;
pub use rust::RustAdaptor;

/// Errors from language adaptors
#[derive(Debug, Error)]
pub enum LangError {
    #[error("{adaptor} adaptor cannot handle {app} app")]
    ProgramMismatch { adaptor: ProgramType, app: ProgramType },
    #[error("no language adaptor for {0}")]
    Unsupported(ProgramType),
    #[error("app '{0}' has no local config")]
    MissingLocalConfig(String),
    #[error("app '{0}' has no remote config; initialize it first")]
    MissingRemoteConfig(String),
    #[error("{tool} has no default recipe that can run in the container; set build commands")]
    NoRemoteRecipe { tool: &'static str },
    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl LangError {
    pub fn is_configuration(&self) -> bool {
        !matches!(self, LangError::Tool(ToolError::Build { .. } | ToolError::Download { .. } | ToolError::Io(_)))
    }
}

/// Capabilities that vary by program type.
#[async_trait]
pub trait LanguageAdaptor: Send + Sync {
    fn program_type(&self) -> ProgramType;

    /// Debugger installed into the container for this language.
    fn debug_tool(&self) -> &dyn DebugTool;

    /// Shell command that builds the debuggee, run from `working_dir`.
    fn build_command(&self, app: &App) -> Result<String, LangError>;

    /// Shell command that starts the debugger listening on the remote port.
    fn debug_command(&self, app: &App) -> Result<String, LangError>;

    /// Provision this language's debug tool locally for the app's architecture.
    async fn provision_debug_tool(
        &self,
        app: &App,
        tools: &ToolProvisioner,
    ) -> Result<PathBuf, LangError> {
        let local = self.check(app)?;
        let overrides =
            local.debug_tool_builder.as_ref().map(|b| b.build_commands.as_slice()).unwrap_or_default();
        Ok(tools.ensure_local_tool(self.debug_tool(), app.remote_runtime.target_arch, overrides).await?)
    }

    /// Commands that build the debug tool inside the container, writing
    /// `$MIRAGE_TOOL_DEST`. Used when the tool builder type is `remote`.
    fn remote_build_commands(&self, app: &App) -> Result<Vec<String>, LangError> {
        let local = self.check(app)?;
        if let Some(builder) = &local.debug_tool_builder {
            if !builder.build_commands.is_empty() {
                return Ok(builder.build_commands.clone());
            }
        }
        match self.debug_tool().recipe(app.remote_runtime.target_arch)? {
            Recipe::Build(commands) => Ok(commands),
            Recipe::Download(_) => Err(LangError::NoRemoteRecipe { tool: self.debug_tool().name() }),
        }
    }

    /// Reject apps of another program type; returns the local config.
    fn check<'a>(&self, app: &'a App) -> Result<&'a LocalConfig, LangError> {
        if app.program_type != self.program_type() {
            return Err(LangError::ProgramMismatch {
                adaptor: self.program_type(),
                app: app.program_type,
            });
        }
        app.local_config.as_ref().ok_or_else(|| LangError::MissingLocalConfig(app.name.clone()))
    }
}

/// Remote config of an app, or the error adaptors report without one.
pub(crate) fn remote_config(app: &App) -> Result<&RemoteConfig, LangError> {
    app.remote_config.as_ref().ok_or_else(|| LangError::MissingRemoteConfig(app.name.clone()))
}

/// Path of the debuggee inside the container.
pub(crate) fn remote_binary(local: &LocalConfig, remote: &RemoteConfig) -> String {
    remote.remote_binary(&local.binary_name())
}

/// Adaptors keyed by program type.
#[derive(Clone)]
pub struct LanguageAdaptors {
    adaptors: HashMap<ProgramType, Arc<dyn LanguageAdaptor>>,
}

impl LanguageAdaptors {
    pub fn empty() -> Self {
        Self { adaptors: HashMap::new() }
    }

    /// Go and Rust.
    pub fn standard() -> Self {
        Self::empty().with(GoAdaptor).with(RustAdaptor)
    }

    pub fn with(mut self, adaptor: impl LanguageAdaptor + 'static) -> Self {
        self.adaptors.insert(adaptor.program_type(), Arc::new(adaptor));
        self
    }

    pub fn get(&self, program_type: ProgramType) -> Result<Arc<dyn LanguageAdaptor>, LangError> {
        self.adaptors.get(&program_type).cloned().ok_or(LangError::Unsupported(program_type))
    }
}

impl Default for LanguageAdaptors {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[path = "lang_tests.rs"]
mod tests;
