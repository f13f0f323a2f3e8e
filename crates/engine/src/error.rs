// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator error types

use mirage_adapters::{KubeError, LangError};
use mirage_storage::RegistryError;
use thiserror::Error;

/// Errors returned by orchestrator operations
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("app '{0}' has no local config")]
    MissingLocalConfig(String),
    #[error("app '{0}' has no debug tool builder")]
    MissingDebugToolBuilder(String),
    #[error("app '{0}' is not initialized for remote debugging; run init first")]
    NotInitialized(String),
    #[error("app '{0}' has no pod template snapshot to roll back to")]
    NoSnapshot(String),
    #[error("pod template of app '{0}' has no labels to select pods by")]
    NoPodSelector(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Language(#[from] LangError),
    #[error(transparent)]
    Cluster(#[from] KubeError),
    #[error("corrupt pod template snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("debuggee failed to launch: {0}")]
    Launch(#[source] KubeError),
}

impl OrchestratorError {
    /// Configuration problems: surfaced immediately and not worth retrying.
    pub fn is_configuration(&self) -> bool {
        match self {
            OrchestratorError::MissingLocalConfig(_)
            | OrchestratorError::MissingDebugToolBuilder(_)
            | OrchestratorError::NotInitialized(_)
            | OrchestratorError::NoSnapshot(_)
            | OrchestratorError::NoPodSelector(_) => true,
            OrchestratorError::Registry(e) => {
                matches!(e, RegistryError::NotFound(_) | RegistryError::Invalid(_))
            }
            OrchestratorError::Language(e) => e.is_configuration(),
            OrchestratorError::Cluster(e) => e.is_configuration(),
            OrchestratorError::Snapshot(_) | OrchestratorError::Launch(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
