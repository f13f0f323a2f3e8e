// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debuggee launch and workload rollback.

use mirage_adapters::kube::copy::copy_to_pod;
use mirage_adapters::kube::template::{self, DEBUG_OUTPUT};
use mirage_adapters::kube::sh;
use mirage_adapters::{Cluster, ContainerRef, ExecOptions, KubeError, TunnelDialer, WorkloadRef};
use mirage_core::AppStatus;
use mirage_storage::AppRegistry;

use super::{Debuggee, Orchestrator};
use crate::{OrchestratorError, Phase};

/// Longest process name `pkill` matches against (`comm`).
const PROCESS_NAME_MAX: usize = 15;

impl<C, D, R> Orchestrator<C, D, R>
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    /// Copy the locally built debuggee into the pod and launch it under the
    /// debug tool.
    ///
    /// Returns once the launch has survived the settle delay. The remote
    /// process keeps running in the background with its output appended to
    /// [`DEBUG_OUTPUT`].
    pub async fn start_debugging(&self, name: &str) -> Result<AppStatus, OrchestratorError> {
        let _guard = self.app_locks.lock(name.to_string()).await;
        let result = self.start_debugging_locked(name).await;
        if let Err(e) = &result {
            self.settle_after_error(name, e).await;
        }
        result
    }

    async fn start_debugging_locked(&self, name: &str) -> Result<AppStatus, OrchestratorError> {
        let mut app = self.registry.get(name)?;
        let local = app
            .local_config
            .clone()
            .ok_or_else(|| OrchestratorError::MissingLocalConfig(name.to_string()))?;
        let remote = app
            .remote_config
            .clone()
            .ok_or_else(|| OrchestratorError::NotInitialized(name.to_string()))?;
        let adaptor = self.languages.get(app.program_type)?;
        let command = adaptor.debug_command(&app)?;
        let target = self.current_container(&app).await?;

        // The pod may have been replaced since init: the tool and the tunnel
        // must follow the debuggee.
        let tunnel_pod = self.tunnel_pod(name).await;
        if tunnel_pod.as_deref() != Some(target.pod.as_str()) {
            let source = local
                .debug_tool_builder
                .as_ref()
                .map(|b| b.source)
                .ok_or_else(|| OrchestratorError::MissingDebugToolBuilder(name.to_string()))?;
            tracing::info!(
                app = %name,
                old_pod = tunnel_pod.as_deref().unwrap_or("-"),
                new_pod = %target.pod,
                "pod changed since init, reinstalling debug tool",
            );
            self.enter(name, Phase::ToolProvisioning);
            self.install_debug_tool(&mut app, adaptor.as_ref(), source, &target).await?;
            self.registry.update(&app)?;
            self.enter(name, Phase::TunnelEstablishing);
            self.ensure_tunnel(name, &target.namespace, &target.pod, remote.remote_debugging_port)
                .await;
        }

        self.forget_debuggee(name);
        let binary_name = local.binary_name();
        self.ensure_remote_dir(&target, &remote.remote_app_location).await?;
        copy_to_pod(
            &self.cluster,
            &target,
            &local.binary_path(),
            Some(&binary_name),
            &remote.remote_app_location,
        )
        .await?;
        tracing::info!(app = %name, pod = %target.pod, binary = %binary_name, "debuggee copied");

        for process in [remote.debug_tool_name(), binary_name.as_str()] {
            self.pre_kill(&target, process).await;
        }

        let launch = sh(format!("exec {command} >> {DEBUG_OUTPUT} 2>&1"));
        let cluster = self.cluster.clone();
        let exec_target = target.clone();
        let mut handle = tokio::spawn(async move {
            cluster.exec(&exec_target, launch, ExecOptions::default()).await
        });

        let debugging = match tokio::time::timeout(self.config.settle, &mut handle).await {
            Err(_elapsed) => {
                self.debuggees
                    .lock()
                    .insert(name.to_string(), Debuggee { pod: target.pod.clone(), handle });
                true
            }
            Ok(Ok(Ok(_))) => {
                tracing::warn!(app = %name, pod = %target.pod, "debuggee exited during settle delay");
                false
            }
            Ok(Ok(Err(e))) => return Err(OrchestratorError::Launch(e)),
            Ok(Err(join)) => return Err(OrchestratorError::Launch(KubeError::Exec(join.to_string()))),
        };

        self.enter(name, if debugging { Phase::Debugging } else { Phase::Ready });
        tracing::info!(app = %name, pod = %target.pod, debugging, "debuggee launched");
        let configured = self.is_configured(&app).await;
        let connected = self.is_connected(name).await;
        Ok(AppStatus::new(name).configured(configured).connected(connected).debugging(debugging))
    }

    /// Best effort; a missing process or missing `pkill` is fine.
    async fn pre_kill(&self, target: &ContainerRef, process: &str) {
        let pattern: String = process.chars().take(PROCESS_NAME_MAX).collect();
        if pattern.is_empty() {
            return;
        }
        let argv = vec!["pkill".to_string(), "-9".to_string(), pattern];
        if let Err(e) = self.cluster.exec(target, argv, ExecOptions::default()).await {
            tracing::debug!(pod = %target.pod, %process, error = %e, "pre-kill");
        }
    }

    /// Write the pre-debug snapshot back as the live pod template.
    ///
    /// The tunnel and the installed tool are left in place, and the
    /// snapshot is kept so a later init starts from the same original.
    pub async fn rollback(&self, name: &str) -> Result<AppStatus, OrchestratorError> {
        let _guard = self.app_locks.lock(name.to_string()).await;
        let result = self.rollback_locked(name).await;
        if let Err(e) = &result {
            self.settle_after_error(name, e).await;
        }
        result
    }

    async fn rollback_locked(&self, name: &str) -> Result<AppStatus, OrchestratorError> {
        let app = self.registry.get(name)?;
        let snapshot = app
            .remote_config
            .as_ref()
            .filter(|r| r.has_snapshot())
            .map(|r| r.initial_config.as_str())
            .ok_or_else(|| OrchestratorError::NoSnapshot(name.to_string()))?;
        let original = template::restore(snapshot)?;

        let workload = WorkloadRef::of(&app);
        self.cluster.replace_pod_template(&workload, original).await?;
        self.forget_debuggee(name);
        self.enter(name, Phase::Idle);
        tracing::info!(app = %name, %workload, "workload rolled back");

        let connected = self.is_connected(name).await;
        Ok(AppStatus::new(name).connected(connected))
    }
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
