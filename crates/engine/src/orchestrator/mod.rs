// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debug session orchestrator.
//!
//! Composes the cluster primitives into the public operations:
//!
//! - [`Orchestrator::init_remote`]: debug-shape the workload, wait for the
//!   pod, install the debug tool, open the tunnel
//! - [`Orchestrator::start_debugging`]: copy the debuggee in and launch it
//!   under the debug tool
//! - [`Orchestrator::rollback`]: restore the pre-debug pod template
//! - [`Orchestrator::status`], [`Orchestrator::stop_session`],
//!   [`Orchestrator::shutdown`]
//!
//! State-mutating operations on one app are serialized by a per-app lock;
//! different apps proceed independently. The session table (app → tunnel)
//! sits behind a reader/writer lock and an old tunnel is always stopped
//! before its replacement starts.

mod debug;
mod init;

use std::collections::HashMap;

use mirage_adapters::kube::pods::find_active_pod;
use mirage_adapters::kube::template;
use mirage_adapters::{
    Cluster, ContainerRef, ExecOptions, ExecOutput, ForwardState, ForwardTarget, KeyedLocks,
    KubeError, LanguageAdaptors, PortForwarder, ToolProvisioner, TunnelDialer, WorkloadRef,
};
use mirage_core::{App, AppStatus};
use mirage_storage::AppRegistry;
use parking_lot::Mutex;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::{OrchestratorConfig, OrchestratorError, Phase};

/// Orchestrator collaborators
pub struct OrchestratorDeps<C, D, R> {
    pub cluster: C,
    pub dialer: D,
    pub registry: R,
    pub languages: LanguageAdaptors,
    pub tools: ToolProvisioner,
}

/// Background `exec` running the debuggee.
struct Debuggee {
    pod: String,
    handle: JoinHandle<Result<ExecOutput, KubeError>>,
}

pub struct Orchestrator<C, D: TunnelDialer, R> {
    cluster: C,
    dialer: D,
    registry: R,
    languages: LanguageAdaptors,
    tools: ToolProvisioner,
    config: OrchestratorConfig,
    app_locks: KeyedLocks<String>,
    sessions: RwLock<HashMap<String, PortForwarder<D>>>,
    debuggees: Mutex<HashMap<String, Debuggee>>,
    phases: Mutex<HashMap<String, Phase>>,
}

impl<C, D, R> Orchestrator<C, D, R>
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    pub fn new(deps: OrchestratorDeps<C, D, R>, config: OrchestratorConfig) -> Self {
        Self {
            cluster: deps.cluster,
            dialer: deps.dialer,
            registry: deps.registry,
            languages: deps.languages,
            tools: deps.tools,
            config,
            app_locks: KeyedLocks::new(),
            sessions: RwLock::new(HashMap::new()),
            debuggees: Mutex::new(HashMap::new()),
            phases: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Last phase recorded for an app.
    pub fn phase(&self, app: &str) -> Phase {
        self.phases.lock().get(app).copied().unwrap_or_default()
    }

    fn enter(&self, app: &str, phase: Phase) {
        let previous = self.phases.lock().insert(app.to_string(), phase).unwrap_or_default();
        if previous != phase {
            tracing::info!(%app, from = %previous, to = %phase, "phase");
        }
    }

    /// After a failed operation, fall back to the last stable phase.
    async fn settle_after_error(&self, app: &str, err: &OrchestratorError) {
        let stable = if self.sessions.read().await.contains_key(app) { Phase::Ready } else { Phase::Idle };
        self.enter(app, stable);
        if err.is_configuration() {
            tracing::warn!(%app, error = %err, "configuration error");
        } else {
            tracing::error!(%app, error = %err, "operation failed");
        }
    }

    /// Current status of one app.
    ///
    /// `configured` means the live template carries this app's debug label,
    /// also under `noModifyConfig`; `connected` and `debugging`
    /// reflect this process's tunnels and launched debuggees.
    pub async fn status(&self, name: &str) -> Result<AppStatus, OrchestratorError> {
        let app = self.registry.get(name)?;
        let mut status = AppStatus::new(name);

        match self.cluster.pod_template(&WorkloadRef::of(&app)).await {
            Ok(live) => status.configured = template::is_configured(&live, name),
            Err(e) => status.error = Some(e.to_string()),
        }

        status.connected = self.is_connected(name).await;
        status.debugging = self.is_debugging(name);
        Ok(status)
    }

    async fn is_connected(&self, name: &str) -> bool {
        self.sessions.read().await.get(name).is_some_and(|f| f.state() == ForwardState::Forwarding)
    }

    /// Live template carries the app's debug label; unreadable counts as not.
    async fn is_configured(&self, app: &App) -> bool {
        match self.cluster.pod_template(&WorkloadRef::of(app)).await {
            Ok(live) => template::is_configured(&live, &app.name),
            Err(e) => {
                tracing::debug!(app = %app.name, error = %e, "template read");
                false
            }
        }
    }

    /// Pod the app's tunnel currently targets.
    async fn tunnel_pod(&self, name: &str) -> Option<String> {
        self.sessions.read().await.get(name).map(|f| f.pod_name().to_string())
    }

    fn is_debugging(&self, name: &str) -> bool {
        self.debuggees.lock().get(name).is_some_and(|d| !d.handle.is_finished())
    }

    /// Tear down an app's tunnel and forget its debuggee. Returns whether a
    /// tunnel existed.
    pub async fn stop_session(&self, name: &str) -> bool {
        let forwarder = self.sessions.write().await.remove(name);
        self.forget_debuggee(name);
        match forwarder {
            Some(forwarder) => {
                forwarder.stop().await;
                self.enter(name, Phase::Idle);
                tracing::info!(app = %name, port = forwarder.local_port(), "session stopped");
                true
            }
            None => false,
        }
    }

    /// Stop every tunnel. Remote processes and workloads are left as they are.
    pub async fn shutdown(&self) {
        let sessions: Vec<_> = self.sessions.write().await.drain().collect();
        for (name, forwarder) in sessions {
            forwarder.stop().await;
            self.forget_debuggee(&name);
            tracing::info!(app = %name, "session stopped for shutdown");
        }
    }

    pub async fn session_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    fn forget_debuggee(&self, name: &str) {
        if let Some(old) = self.debuggees.lock().remove(name) {
            old.handle.abort();
            tracing::debug!(app = %name, pod = %old.pod, "detached from debuggee");
        }
    }

    /// Point the app's tunnel at `pod:port`, replacing a tunnel that targets
    /// anything else. The old tunnel is fully stopped first.
    async fn ensure_tunnel(&self, name: &str, namespace: &str, pod: &str, port: u16) {
        let target = ForwardTarget {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            local_port: port,
            remote_port: port,
        };

        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(name) {
            if existing.target() == &target {
                existing.start();
                return;
            }
        }
        if let Some(previous) = sessions.remove(name) {
            tracing::info!(app = %name, old_pod = %previous.pod_name(), new_pod = %pod, port, "replacing tunnel");
            previous.stop().await;
        }
        let forwarder = PortForwarder::new(self.dialer.clone(), target, self.config.forward_backoff);
        forwarder.start();
        sessions.insert(name.to_string(), forwarder);
    }

    /// Label selector for the pods the app's debuggee runs in.
    async fn pod_selector(&self, app: &App) -> Result<String, OrchestratorError> {
        let no_modify = app.remote_config.as_ref().is_some_and(|r| r.no_modify_config);
        if !no_modify {
            return Ok(template::debug_selector(&app.name));
        }
        let live = self.cluster.pod_template(&WorkloadRef::of(app)).await?;
        template::labels_selector(&live).ok_or_else(|| OrchestratorError::NoPodSelector(app.name.clone()))
    }

    /// Newest pod for the app, addressed at its debug container.
    async fn current_container(&self, app: &App) -> Result<ContainerRef, OrchestratorError> {
        let container = app
            .remote_runtime
            .container_name
            .clone()
            .ok_or_else(|| OrchestratorError::NotInitialized(app.name.clone()))?;
        let namespace = &app.remote_runtime.namespace;
        let selector = self.pod_selector(app).await?;
        let pod = find_active_pod(&self.cluster, namespace, &selector).await?;
        let pod = pod.metadata.name.unwrap_or_default();
        Ok(ContainerRef::new(namespace, pod, container))
    }

    /// `mkdir -p` a remote directory.
    async fn ensure_remote_dir(&self, target: &ContainerRef, dir: &str) -> Result<(), KubeError> {
        let argv = ["mkdir", "-p", dir].map(str::to_string).to_vec();
        self.cluster.exec(target, argv, ExecOptions::default()).await.map(|_| ())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
