// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mirage-adapters: cluster primitives, debug tools, and language adaptors

pub mod keyed_lock;
pub mod kube;
pub mod lang;
pub mod shell;
pub mod tools;

pub use keyed_lock::KeyedLocks;
pub use kube::{
    Cluster, ContainerRef, ExecOptions, ExecOutput, ForwardBackoff, ForwardState, ForwardTarget,
    KubeCluster, KubeError, KubeTunnelDialer, PortForwarder, Tunnel, TunnelDialer, WorkloadRef,
};
pub use lang::{LangError, LanguageAdaptor, LanguageAdaptors};
pub use shell::{ShellError, ShellOptions};
pub use tools::{DebugTool, Recipe, ToolError, ToolProvisioner};

#[cfg(any(test, feature = "test-support"))]
pub use kube::{fake_pod, ClusterCall, DialOutcome, FakeCluster, FakeTunnelDialer};
