// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator fixture over the in-memory fakes.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use k8s_openapi::api::core::v1::{
    Container, ExecAction, PodSpec, PodTemplateSpec, Probe, SecurityContext,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use mirage_adapters::tools::Delve;
use mirage_adapters::{
    FakeCluster, FakeTunnelDialer, LanguageAdaptors, ToolProvisioner, WorkloadRef,
};
use mirage_core::test_support::{demo_app, demo_local_config};
use mirage_core::{App, Arch, WorkloadType};
use mirage_storage::{AppRegistry, MemoryRegistry};
use tempfile::TempDir;

use crate::{Orchestrator, OrchestratorConfig, OrchestratorDeps};

pub(crate) type TestOrchestrator = Orchestrator<FakeCluster, FakeTunnelDialer, MemoryRegistry>;

/// Bytes of the fake cached debug tool.
pub(crate) const TOOL_BYTES: &[u8] = b"dlv-binary";
/// Bytes of the fake locally built debuggee.
pub(crate) const BINARY_BYTES: &[u8] = b"demo-binary";

/// Deployment template: one `app` container with a readiness probe.
pub(crate) fn demo_template() -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(BTreeMap::from([("app".to_string(), "demo".to_string())])),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "app".to_string(),
                image: Some("registry.local/demo:1.0".to_string()),
                command: Some(vec!["/server".to_string()]),
                readiness_probe: Some(Probe {
                    exec: Some(ExecAction { command: Some(vec!["true".to_string()]) }),
                    ..Default::default()
                }),
                security_context: Some(SecurityContext {
                    read_only_root_filesystem: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }),
    }
}

pub(crate) fn demo_workload() -> WorkloadRef {
    WorkloadRef::new("default", WorkloadType::Deployment, "demo")
}

pub(crate) struct Fixture {
    pub orchestrator: TestOrchestrator,
    pub cluster: FakeCluster,
    pub dialer: FakeTunnelDialer,
    pub registry: MemoryRegistry,
    pub workdir: TempDir,
    _tools_dir: TempDir,
}

impl Fixture {
    /// Go app `demo` with a built binary and a cached amd64 Delve.
    pub fn new() -> Self {
        Self::with_config(fast_config())
    }

    pub fn with_config(config: OrchestratorConfig) -> Self {
        let workdir = tempfile::tempdir().unwrap();
        write_file(&workdir.path().join("bin/demo"), BINARY_BYTES);

        let tools_dir = tempfile::tempdir().unwrap();
        let tools = ToolProvisioner::new(tools_dir.path());
        write_file(&tools.cache_path(&Delve, Arch::Amd64), TOOL_BYTES);

        let cluster = FakeCluster::new();
        cluster.add_workload(demo_workload(), demo_template());
        let dialer = FakeTunnelDialer::new();
        let app = demo_app("demo").local_config(demo_local_config(workdir.path()));
        let registry = MemoryRegistry::with_apps([app]);

        let orchestrator = Orchestrator::new(
            OrchestratorDeps {
                cluster: cluster.clone(),
                dialer: dialer.clone(),
                registry: registry.clone(),
                languages: LanguageAdaptors::standard(),
                tools,
            },
            config,
        );
        Self { orchestrator, cluster, dialer, registry, workdir, _tools_dir: tools_dir }
    }

    pub fn app(&self) -> App {
        self.registry.get("demo").unwrap()
    }

    pub fn update_app(&self, edit: impl FnOnce(&mut App)) {
        let mut app = self.app();
        edit(&mut app);
        self.registry.update(&app).unwrap();
    }

    pub fn live_template(&self) -> PodTemplateSpec {
        self.cluster.template(&demo_workload()).unwrap()
    }
}

/// Defaults with a short pod poll so tests don't wait on real time.
pub(crate) fn fast_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.pod_wait.interval = Duration::from_millis(10);
    config.pod_wait.timeout = Duration::from_millis(200);
    config.settle = Duration::from_millis(50);
    config
}

/// Let spawned background tasks (tunnel supervisors) make progress.
pub(crate) async fn run_background() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Archive entries `(path, bytes)` of a tar stream.
pub(crate) fn archive_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;
    let mut archive = tar::Archive::new(bytes);
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (path, data)
        })
        .collect()
}

fn write_file(path: &Path, bytes: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}
