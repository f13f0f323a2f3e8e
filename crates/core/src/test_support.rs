// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{App, DebugToolBuilder, LocalConfig, ProgramType, RemoteRuntime, WorkloadType};

pub const DEMO_NAMESPACE: &str = "default";
pub const DEMO_WORKLOAD: &str = "demo";
pub const DEMO_CONTAINER: &str = "app";

/// Deployment `demo` in `default`, container left unset.
pub fn demo_runtime() -> RemoteRuntime {
    RemoteRuntime {
        namespace: DEMO_NAMESPACE.to_string(),
        workload_type: WorkloadType::Deployment,
        workload_name: DEMO_WORKLOAD.to_string(),
        container_name: None,
        target_arch: Default::default(),
    }
}

/// Local config building `bin/demo` under `working_dir`.
pub fn demo_local_config(working_dir: impl Into<std::path::PathBuf>) -> LocalConfig {
    LocalConfig::new(working_dir, "bin/demo")
        .app_entry_path("./cmd/demo")
        .app_args("--listen :8080")
        .debug_tool_builder(DebugToolBuilder::default())
}

/// A Go app with a local config and no remote config yet.
pub fn demo_app(name: &str) -> App {
    App::new(name, ProgramType::Go, demo_runtime()).local_config(demo_local_config("/work/demo"))
}

/// Same as [`demo_app`] but for the Rust adaptor.
pub fn demo_rust_app(name: &str) -> App {
    App::new(name, ProgramType::Rust, demo_runtime())
        .local_config(LocalConfig::new("/work/demo", "target/debug/demo").app_args("--verbose"))
}
