// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes primitives used by the debug orchestrator.
//!
//! # Module layout
//!
//! - [`template`]: pure debug-shape computation over pod templates
//! - [`pods`]: locating the newest pod for a selector and waiting for it to run
//! - [`copy`]: streaming local files into a container through `tar -x`
//! - [`forward`]: supervised local⇄pod port-forward tunnels
//!
//! All cluster I/O goes through the [`Cluster`] trait (implemented by
//! [`KubeCluster`]) and the [`TunnelDialer`] trait, so every component above
//! runs against the in-memory fakes in tests.

mod client;
pub mod copy;
mod exec;
pub mod forward;
pub mod pods;
pub mod template;

#[cfg(any(test, feature = "test-support"))]
mod fake;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, PodTemplateSpec};
use mirage_core::{App, WorkloadType};
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;

pub use client::KubeCluster;
pub use exec::exit_code;
pub use forward::{
    ForwardBackoff, ForwardState, ForwardTarget, KubeTunnelDialer, PortForwarder, Tunnel,
    TunnelDialer,
};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{fake_pod, ClusterCall, DialOutcome, FakeCluster, FakeTunnelDialer};

/// Errors from cluster operations
#[derive(Debug, Error)]
pub enum KubeError {
    #[error("failed to create kube client: {0}")]
    Client(String),
    #[error("kubernetes API error: {0}")]
    Api(#[from] kube::Error),
    #[error("cluster request failed: {0}")]
    Request(String),
    #[error("no pod found for selector '{selector}'")]
    NoPodFound { selector: String },
    #[error("pod {pod} is not running (phase {phase}{})", fmt_reason(.reason))]
    PodNotRunning { pod: String, phase: String, reason: Option<String> },
    #[error("timed out after {}s waiting for a running pod", .0.as_secs())]
    PodWaitTimeout(Duration),
    #[error("pod template has no containers")]
    NoContainers,
    #[error("container '{0}' not found in pod template")]
    ContainerNotFound(String),
    #[error("exec failed: {0}")]
    Exec(String),
    #[error("`{command}` exited with status {code}: {stderr}")]
    ExitStatus { command: String, code: i32, stderr: String },
    #[error("stream error: {0}")]
    Stream(#[from] std::io::Error),
    #[error("failed to archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("port-forward failed: {0}")]
    Forward(String),
}

fn fmt_reason(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(", {r}")).unwrap_or_default()
}

impl KubeError {
    /// The template does not describe a debuggable container; retrying won't help.
    pub fn is_configuration(&self) -> bool {
        matches!(self, KubeError::NoContainers | KubeError::ContainerNotFound(_))
    }
}

/// A workload that owns a pod template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkloadRef {
    pub namespace: String,
    pub kind: WorkloadType,
    pub name: String,
}

impl WorkloadRef {
    pub fn new(namespace: impl Into<String>, kind: WorkloadType, name: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), kind, name: name.into() }
    }

    /// The workload an app is configured against.
    pub fn of(app: &App) -> Self {
        let rt = &app.remote_runtime;
        Self::new(&rt.namespace, rt.workload_type, &rt.workload_name)
    }
}

impl std::fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// A container inside a specific pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    pub namespace: String,
    pub pod: String,
    pub container: String,
}

impl ContainerRef {
    pub fn new(
        namespace: impl Into<String>,
        pod: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self { namespace: namespace.into(), pod: pod.into(), container: container.into() }
    }
}

/// Optional input stream and live output sink for [`Cluster::exec`].
#[derive(Default)]
pub struct ExecOptions {
    /// Streamed to the remote command's stdin; no stdin is attached when unset.
    pub stdin: Option<Box<dyn AsyncRead + Send + Unpin>>,
    /// Receives each stdout/stderr line as it arrives.
    pub live: Option<mpsc::UnboundedSender<String>>,
}

impl ExecOptions {
    pub fn with_stdin(stdin: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self { stdin: Some(Box::new(stdin)), live: None }
    }

    pub fn with_live(live: mpsc::UnboundedSender<String>) -> Self {
        Self { stdin: None, live: Some(live) }
    }
}

/// Captured output of a remote command that exited with status 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// The slice of the Kubernetes API the orchestrator depends on.
#[async_trait]
pub trait Cluster: Clone + Send + Sync + 'static {
    /// Current pod template of a workload.
    async fn pod_template(&self, workload: &WorkloadRef) -> Result<PodTemplateSpec, KubeError>;

    /// Replace the pod template of a workload, keeping the rest of its spec.
    async fn replace_pod_template(
        &self,
        workload: &WorkloadRef,
        template: PodTemplateSpec,
    ) -> Result<(), KubeError>;

    /// Pods in `namespace` matching a `k=v[,k=v]` label selector.
    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>, KubeError>;

    /// Run `command` in a container and wait for it to exit.
    ///
    /// A non-zero exit surfaces as [`KubeError::ExitStatus`].
    async fn exec(
        &self,
        target: &ContainerRef,
        command: Vec<String>,
        options: ExecOptions,
    ) -> Result<ExecOutput, KubeError>;
}

/// Build an argv that runs `script` through `sh -c`.
pub fn sh(script: impl Into<String>) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.into()]
}
