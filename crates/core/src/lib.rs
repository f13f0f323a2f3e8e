// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mirage-core: data model shared by the mirage debug orchestrator crates

pub mod macros;

pub mod app;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use app::{
    App, Arch, DebugToolBuilder, DebugToolSource, IdeType, LocalConfig, ProgramType,
    RemoteConfig, RemoteRuntime, WorkloadType,
};
pub use status::AppStatus;

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {})", .expected.join(", "))]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static [&'static str],
}
