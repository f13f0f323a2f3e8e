// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mirage-engine: the debug session orchestrator

mod config;
mod error;
mod orchestrator;
mod phase;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::OrchestratorConfig;
pub use error::OrchestratorError;
pub use orchestrator::{Orchestrator, OrchestratorDeps};
pub use phase::Phase;
