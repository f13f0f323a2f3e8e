// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote initialization.

use mirage_adapters::kube::copy::copy_to_pod;
use mirage_adapters::kube::pods::{wait_for_running, PodWait};
use mirage_adapters::kube::{sh, template};
use mirage_adapters::tools::{TARGET_ARCH_ENV, TOOL_DEST_ENV};
use mirage_adapters::{
    Cluster, ContainerRef, ExecOptions, LanguageAdaptor, TunnelDialer, WorkloadRef,
};
use mirage_core::{App, AppStatus, DebugToolSource, RemoteConfig};
use mirage_storage::AppRegistry;
use rand::Rng;
use tokio::sync::mpsc;

use super::Orchestrator;
use crate::{OrchestratorError, Phase};

impl<C, D, R> Orchestrator<C, D, R>
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    /// Prepare an app's workload and pod for debugging and open its tunnel.
    ///
    /// Safe to repeat: the debug shape is always recomputed from the stored
    /// pre-debug snapshot, and the workload is only updated when the live
    /// template differs from it.
    pub async fn init_remote(&self, name: &str) -> Result<AppStatus, OrchestratorError> {
        let _guard = self.app_locks.lock(name.to_string()).await;
        let result = self.init_remote_locked(name).await;
        if let Err(e) = &result {
            self.settle_after_error(name, e).await;
        }
        result
    }

    async fn init_remote_locked(&self, name: &str) -> Result<AppStatus, OrchestratorError> {
        let mut app = self.registry.get(name)?;
        let local = app
            .local_config
            .as_ref()
            .ok_or_else(|| OrchestratorError::MissingLocalConfig(name.to_string()))?;
        let source = local
            .debug_tool_builder
            .as_ref()
            .map(|b| b.source)
            .ok_or_else(|| OrchestratorError::MissingDebugToolBuilder(name.to_string()))?;
        let adaptor = self.languages.get(app.program_type)?;

        self.enter(name, Phase::Configuring);
        let workload = WorkloadRef::of(&app);
        let namespace = app.remote_runtime.namespace.clone();
        let live = self.cluster.pod_template(&workload).await?;
        let container =
            template::resolve_container(&live, app.remote_runtime.container_name.as_deref())?;
        app.remote_runtime.container_name = Some(container.clone());

        let remote = app.remote_config.get_or_insert_with(|| {
            let port = rand::thread_rng().gen_range(self.config.port_range.clone());
            tracing::info!(app = %name, port, "assigned remote debugging port");
            RemoteConfig::new(&self.config.remote_tool_path, &self.config.remote_app_location, port)
        });
        let port = remote.remote_debugging_port;
        let no_modify = remote.no_modify_config;

        let desired = if no_modify {
            None
        } else {
            let original = if remote.has_snapshot() {
                template::restore(&remote.initial_config)?
            } else {
                remote.initial_config = template::snapshot(&live)?;
                live.clone()
            };
            Some(template::apply_debug_shape(&original, name, &container)?)
        };

        // Persist the snapshot before touching the workload.
        self.registry.update(&app)?;

        let mut rolled_out = false;
        let mut configured = template::is_configured(&live, name);
        if let Some(desired) = desired {
            configured = template::is_configured(&desired, name);
            if desired != live {
                tracing::info!(app = %name, %workload, "applying debug shape");
                self.cluster.replace_pod_template(&workload, desired).await?;
                rolled_out = true;
            } else {
                tracing::debug!(app = %name, %workload, "workload already in debug shape");
            }
        }

        self.enter(name, Phase::WaitingForPod);
        let selector = self.pod_selector(&app).await?;
        let wait = PodWait { delay_first_poll: rolled_out, ..self.config.pod_wait };
        let pod = wait_for_running(&self.cluster, &namespace, &selector, wait).await?;
        let target = ContainerRef::new(&namespace, &pod, &container);

        self.enter(name, Phase::ToolProvisioning);
        self.install_debug_tool(&mut app, adaptor.as_ref(), source, &target).await?;
        self.registry.update(&app)?;

        self.enter(name, Phase::TunnelEstablishing);
        self.ensure_tunnel(name, &namespace, &pod, port).await;

        self.enter(name, Phase::Ready);
        tracing::info!(app = %name, %pod, port, "remote initialized");
        Ok(AppStatus::new(name).configured(configured).connected(true))
    }

    /// Put the debug tool into the target container, either copied from the
    /// local cache or built in place.
    pub(super) async fn install_debug_tool(
        &self,
        app: &mut App,
        adaptor: &dyn LanguageAdaptor,
        source: DebugToolSource,
        target: &ContainerRef,
    ) -> Result<(), OrchestratorError> {
        match source {
            DebugToolSource::Local => self.install_local_tool(app, adaptor, target).await,
            DebugToolSource::Remote => self.build_remote_tool(app, adaptor, target).await,
        }
    }

    /// Provision the tool locally, record its cache path, and copy it in.
    async fn install_local_tool(
        &self,
        app: &mut App,
        adaptor: &dyn LanguageAdaptor,
        target: &ContainerRef,
    ) -> Result<(), OrchestratorError> {
        let path = adaptor.provision_debug_tool(app, &self.tools).await?;
        if let Some(builder) = app.local_config.as_mut().and_then(|l| l.debug_tool_builder.as_mut()) {
            builder.local_dest = Some(path.clone());
        }

        let remote = app
            .remote_config
            .as_ref()
            .ok_or_else(|| OrchestratorError::NotInitialized(app.name.clone()))?;
        self.ensure_remote_dir(target, remote.debug_tool_dir()).await?;
        copy_to_pod(
            &self.cluster,
            target,
            &path,
            Some(remote.debug_tool_name()),
            remote.debug_tool_dir(),
        )
        .await?;
        tracing::info!(app = %app.name, pod = %target.pod, tool = %remote.debug_tool_path, "debug tool installed");
        Ok(())
    }

    /// Build the tool inside the container, streaming its output to the log.
    async fn build_remote_tool(
        &self,
        app: &App,
        adaptor: &dyn LanguageAdaptor,
        target: &ContainerRef,
    ) -> Result<(), OrchestratorError> {
        let remote = app
            .remote_config
            .as_ref()
            .ok_or_else(|| OrchestratorError::NotInitialized(app.name.clone()))?;
        let commands = adaptor.remote_build_commands(app)?;
        let script = format!(
            "set -e\nmkdir -p {dir}\nexport {TOOL_DEST_ENV}={path} {TARGET_ARCH_ENV}={arch}\n\
             cd \"$(mktemp -d)\"\n{commands}\nchmod +x {path}",
            dir = remote.debug_tool_dir(),
            path = remote.debug_tool_path,
            arch = app.remote_runtime.target_arch,
            commands = commands.join("\n"),
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let app_name = app.name.clone();
        let relay = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                tracing::info!(app = %app_name, "remote build: {line}");
            }
        });
        let built = self.cluster.exec(target, sh(script), ExecOptions::with_live(tx)).await;
        let _ = relay.await;
        built?;
        tracing::info!(app = %app.name, pod = %target.pod, tool = %remote.debug_tool_path, "debug tool built in container");
        Ok(())
    }
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
