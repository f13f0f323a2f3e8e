// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener context over the in-memory fakes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use mirage_adapters::tools::Delve;
use mirage_adapters::{
    FakeCluster, FakeTunnelDialer, LanguageAdaptors, ToolProvisioner, WorkloadRef,
};
use mirage_core::test_support::{demo_app, demo_local_config};
use mirage_core::{Arch, WorkloadType};
use mirage_engine::{Orchestrator, OrchestratorConfig, OrchestratorDeps};
use mirage_storage::MemoryRegistry;
use tempfile::TempDir;
use tokio::sync::Notify;

use super::ListenCtx;

pub type TestCtx = ListenCtx<FakeCluster, FakeTunnelDialer, MemoryRegistry>;

pub struct Fixture {
    pub ctx: TestCtx,
    pub cluster: FakeCluster,
    pub dialer: FakeTunnelDialer,
    pub registry: MemoryRegistry,
    pub dir: TempDir,
}

pub fn demo_template() -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(BTreeMap::from([("app".to_string(), "demo".to_string())])),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "app".to_string(),
                command: Some(vec!["/server".to_string()]),
                ..Default::default()
            }],
            ..Default::default()
        }),
    }
}

impl Fixture {
    /// Empty registry; deployment `demo` exists; Delve is cached.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let tools = ToolProvisioner::new(dir.path().join("debug-tools"));
        let cached = tools.cache_path(&Delve, Arch::Amd64);
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, b"dlv").unwrap();
        std::fs::create_dir_all(dir.path().join("work/bin")).unwrap();
        std::fs::write(dir.path().join("work/bin/demo"), b"demo").unwrap();

        let cluster = FakeCluster::new();
        cluster.add_workload(
            WorkloadRef::new("default", WorkloadType::Deployment, "demo"),
            demo_template(),
        );
        let dialer = FakeTunnelDialer::new();
        let registry = MemoryRegistry::new();

        let mut config = OrchestratorConfig::default();
        config.pod_wait.interval = Duration::from_millis(10);
        config.pod_wait.timeout = Duration::from_millis(200);
        config.settle = Duration::from_millis(20);

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
        let ctx = ListenCtx {
            orchestrator: Arc::new(orchestrator),
            shutdown: Arc::new(Notify::new()),
            start_time: Instant::now(),
        };
        Self { ctx, cluster, dialer, registry, dir }
    }

    /// `demo` app building into this fixture's work dir.
    pub fn demo(&self) -> mirage_core::App {
        demo_app("demo").local_config(demo_local_config(self.dir.path().join("work")))
    }
}
