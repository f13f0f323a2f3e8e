// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry contract shared by every app store.

use mirage_core::App;
use thiserror::Error;

/// Errors that can occur in registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("app '{0}' not found")]
    NotFound(String),
    #[error("app '{0}' already exists")]
    AlreadyExists(String),
    #[error("invalid app: {0}")]
    Invalid(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Keyed CRUD store for [`App`] records.
///
/// Writes are whole-record: `update` replaces the stored app wholesale, so
/// callers read-modify-write under their own per-app serialization.
pub trait AppRegistry: Clone + Send + Sync + 'static {
    fn create(&self, app: &App) -> Result<(), RegistryError>;
    fn get(&self, name: &str) -> Result<App, RegistryError>;
    fn update(&self, app: &App) -> Result<(), RegistryError>;
    /// Remove a record, returning what was stored.
    fn delete(&self, name: &str) -> Result<App, RegistryError>;
    /// All apps, sorted by name.
    fn list(&self) -> Result<Vec<App>, RegistryError>;
}

/// Reject records the orchestrator cannot act on.
///
/// Names double as file stems, so they are restricted to
/// `[A-Za-z0-9._-]` and may not start with a dot.
pub fn validate_app(app: &App) -> Result<(), RegistryError> {
    validate_name(&app.name)?;
    let runtime = &app.remote_runtime;
    if runtime.namespace.trim().is_empty() {
        return Err(RegistryError::Invalid("remote_runtime.namespace is empty".into()));
    }
    if runtime.workload_name.trim().is_empty() {
        return Err(RegistryError::Invalid("remote_runtime.workload_name is empty".into()));
    }
    if let Some(local) = &app.local_config {
        if local.build_output.as_os_str().is_empty() {
            return Err(RegistryError::Invalid("local_config.build_output is empty".into()));
        }
    }
    Ok(())
}

pub(crate) fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::Invalid("name is empty".into()));
    }
    if name.starts_with('.') {
        return Err(RegistryError::Invalid(format!("name '{name}' may not start with '.'")));
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))) {
        return Err(RegistryError::Invalid(format!("name '{name}' contains '{c}'")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
