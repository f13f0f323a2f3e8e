// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mirage_adapters::kube::template::{self, DEBUG_LABEL};
use mirage_adapters::tools::Delve;
use mirage_adapters::{ClusterCall, ForwardState, KubeError, LangError, ToolError, ToolProvisioner};
use mirage_core::{Arch, DebugToolBuilder, DebugToolSource, ProgramType, RemoteConfig};

use crate::test_helpers::{
    archive_entries, demo_template, demo_workload, run_background, Fixture, TOOL_BYTES,
};
use crate::{OrchestratorError, Phase};

#[tokio::test]
async fn init_applies_debug_shape_and_opens_tunnel() {
    let fx = Fixture::new();

    let status = fx.orchestrator.init_remote("demo").await.unwrap();
    assert!(status.configured);
    assert!(status.connected);
    assert!(!status.debugging);
    assert_eq!(fx.orchestrator.phase("demo"), Phase::Ready);

    let live = fx.live_template();
    assert!(template::is_configured(&live, "demo"));
    let container = &live.spec.as_ref().unwrap().containers[0];
    assert_eq!(container.command.as_deref(), Some(&["/bin/sh".to_string()][..]));
    assert!(container.readiness_probe.is_none());

    let app = fx.app();
    assert_eq!(app.remote_runtime.container_name.as_deref(), Some("app"));
    let remote = app.remote_config.unwrap();
    assert!((50000..60000).contains(&remote.remote_debugging_port));
    assert_eq!(remote.debug_tool_path, "/tmp/debug-tool");
    assert_eq!(template::restore(&remote.initial_config).unwrap(), demo_template());

    run_background().await;
    let dials = fx.dialer.dials();
    assert_eq!(dials.len(), 1);
    assert_eq!(dials[0].0.pod, "demo-2");
    assert_eq!(dials[0].0.local_port, remote.remote_debugging_port);
    assert_eq!(dials[0].0.remote_port, remote.remote_debugging_port);
}

#[tokio::test]
async fn init_twice_updates_workload_once() {
    let fx = Fixture::new();

    fx.orchestrator.init_remote("demo").await.unwrap();
    let first = fx.app().remote_config.unwrap();
    fx.orchestrator.init_remote("demo").await.unwrap();
    let second = fx.app().remote_config.unwrap();

    assert_eq!(fx.cluster.replace_count(), 1);
    assert_eq!(first.initial_config, second.initial_config);
    assert_eq!(first.remote_debugging_port, second.remote_debugging_port);

    run_background().await;
    assert_eq!(fx.dialer.dial_count(), 1);
    assert_eq!(fx.orchestrator.session_names().await, vec!["demo".to_string()]);
}

#[tokio::test]
async fn init_reapplies_shape_after_external_drift() {
    let fx = Fixture::new();
    fx.orchestrator.init_remote("demo").await.unwrap();
    let snapshot = fx.app().remote_config.unwrap().initial_config;

    // Someone strips the debug label by hand.
    let mut drifted = fx.live_template();
    drifted.metadata.as_mut().unwrap().labels.as_mut().unwrap().remove(DEBUG_LABEL);
    fx.cluster.set_template(&demo_workload(), drifted);

    fx.orchestrator.init_remote("demo").await.unwrap();

    assert_eq!(fx.cluster.replace_count(), 2);
    assert!(template::is_configured(&fx.live_template(), "demo"));
    assert_eq!(fx.app().remote_config.unwrap().initial_config, snapshot);
}

#[tokio::test]
async fn init_repoints_tunnel_when_pod_changes() {
    let fx = Fixture::new();
    fx.orchestrator.init_remote("demo").await.unwrap();
    run_background().await;

    fx.cluster.set_template(&demo_workload(), demo_template());
    fx.orchestrator.init_remote("demo").await.unwrap();
    run_background().await;

    let pods: Vec<_> = fx.dialer.dials().into_iter().map(|(t, _)| t.pod).collect();
    assert_eq!(pods, vec!["demo-2".to_string(), "demo-3".to_string()]);
    assert_eq!(fx.dialer.active(), 1);
    assert_eq!(fx.dialer.max_active(), 1);
}

#[tokio::test]
async fn init_copies_cached_tool_into_container() {
    let fx = Fixture::new();
    fx.orchestrator.init_remote("demo").await.unwrap();

    let commands = fx.cluster.exec_commands();
    assert!(commands.contains(&vec!["mkdir".to_string(), "-p".to_string(), "/tmp".to_string()]));

    let inputs = fx.cluster.exec_inputs();
    assert_eq!(inputs.len(), 1);
    let (argv, archive) = &inputs[0];
    assert_eq!(argv.join(" "), "tar -x -o -f - -C /tmp");
    assert_eq!(archive_entries(archive), vec![("debug-tool".to_string(), TOOL_BYTES.to_vec())]);

    let cached = ToolProvisioner::new(fx.orchestrator.tools.root()).cache_path(&Delve, Arch::Amd64);
    let builder = fx.app().local_config.unwrap().debug_tool_builder.unwrap();
    assert_eq!(builder.local_dest, Some(cached));
}

#[tokio::test]
async fn init_builds_tool_inside_container_for_remote_builder() {
    let fx = Fixture::new();
    fx.update_app(|app| {
        let local = app.local_config.as_mut().unwrap();
        local.debug_tool_builder =
            Some(DebugToolBuilder { source: DebugToolSource::Remote, ..Default::default() });
    });
    fx.cluster.stdout_for_exec_matching("MIRAGE_TOOL_DEST", "cloning delve\nbuilding\n");

    fx.orchestrator.init_remote("demo").await.unwrap();

    assert!(fx.cluster.exec_inputs().is_empty());
    let script = fx
        .cluster
        .exec_commands()
        .into_iter()
        .find(|argv| argv[0] == "sh")
        .map(|argv| argv[2].clone())
        .unwrap();
    assert!(script.contains("export MIRAGE_TOOL_DEST=/tmp/debug-tool MIRAGE_TARGET_ARCH=amd64"));
    assert!(script.contains("git clone --depth 1 --branch v1.20.1"));
    assert!(script.ends_with("chmod +x /tmp/debug-tool"));
    assert_eq!(fx.app().local_config.unwrap().debug_tool_builder.unwrap().local_dest, None);
}

#[tokio::test]
async fn remote_build_failure_aborts_init() {
    let fx = Fixture::new();
    fx.update_app(|app| {
        let local = app.local_config.as_mut().unwrap();
        local.debug_tool_builder =
            Some(DebugToolBuilder { source: DebugToolSource::Remote, ..Default::default() });
    });
    fx.cluster.fail_exec_matching("MIRAGE_TOOL_DEST", 127, "git: not found");

    let err = fx.orchestrator.init_remote("demo").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::Cluster(KubeError::ExitStatus { code: 127, .. })));
    assert!(!err.is_configuration());
    assert!(fx.orchestrator.session_names().await.is_empty());
    assert_eq!(fx.orchestrator.phase("demo"), Phase::Idle);
}

#[tokio::test]
async fn init_without_local_config_is_configuration_error() {
    let fx = Fixture::new();
    fx.update_app(|app| app.local_config = None);

    let err = fx.orchestrator.init_remote("demo").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::MissingLocalConfig(ref name) if name == "demo"));
    assert!(err.is_configuration());
    assert_eq!(fx.cluster.replace_count(), 0);
}

#[tokio::test]
async fn init_without_tool_builder_is_configuration_error() {
    let fx = Fixture::new();
    fx.update_app(|app| app.local_config.as_mut().unwrap().debug_tool_builder = None);

    let err = fx.orchestrator.init_remote("demo").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::MissingDebugToolBuilder(_)));
    assert!(err.is_configuration());
}

#[tokio::test]
async fn init_rejects_unknown_container() {
    let fx = Fixture::new();
    fx.update_app(|app| app.remote_runtime.container_name = Some("sidecar".to_string()));

    let err = fx.orchestrator.init_remote("demo").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::Cluster(KubeError::ContainerNotFound(_))));
    assert!(err.is_configuration());
    assert_eq!(fx.cluster.replace_count(), 0);
}

#[tokio::test]
async fn no_modify_uses_existing_pod_by_template_labels() {
    let fx = Fixture::new();
    fx.update_app(|app| {
        let mut remote = RemoteConfig::new("/tmp/debug-tool", "/tmp", 51000);
        remote.no_modify_config = true;
        app.remote_config = Some(remote);
    });

    let status = fx.orchestrator.init_remote("demo").await.unwrap();
    assert!(status.connected);
    assert!(!status.configured);

    assert_eq!(fx.cluster.replace_count(), 0);
    assert_eq!(fx.live_template(), demo_template());
    assert!(fx.cluster.calls().contains(&ClusterCall::ListPods {
        namespace: "default".to_string(),
        selector: "app=demo".to_string(),
    }));
    assert!(!fx.app().remote_config.unwrap().has_snapshot());

    run_background().await;
    let dials = fx.dialer.dials();
    assert_eq!(dials[0].0.pod, "demo-1");
    assert_eq!(dials[0].0.local_port, 51000);
}

#[tokio::test]
async fn pod_wait_failure_keeps_snapshot_and_sessions() {
    let fx = Fixture::new();
    fx.cluster.set_rollout_phase("Pending");

    let err = fx.orchestrator.init_remote("demo").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::Cluster(_)));
    assert!(fx.app().remote_config.unwrap().has_snapshot());
    assert!(fx.orchestrator.session_names().await.is_empty());
    assert_eq!(fx.orchestrator.phase("demo"), Phase::Idle);

    // A retry once the pod comes up completes from the stored snapshot.
    fx.cluster.set_rollout_phase("Running");
    fx.cluster.set_template(&demo_workload(), demo_template());
    fx.orchestrator.init_remote("demo").await.unwrap();
    assert_eq!(fx.cluster.replace_count(), 2);
    run_background().await;
    assert!(fx.orchestrator.status("demo").await.unwrap().connected);
    assert_eq!(fx.dialer.active(), 1);
}

#[tokio::test]
async fn rust_arm64_tool_fails_fast() {
    let fx = Fixture::new();
    fx.update_app(|app| {
        app.program_type = ProgramType::Rust;
        app.remote_runtime.target_arch = Arch::Arm64;
    });

    let err = fx.orchestrator.init_remote("demo").await.unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Language(LangError::Tool(ToolError::UnsupportedArch { arch: Arch::Arm64, .. }))
    ));
    assert!(err.is_configuration());
}

#[tokio::test]
async fn status_reports_forwarding_tunnel() {
    let fx = Fixture::new();
    fx.orchestrator.init_remote("demo").await.unwrap();
    run_background().await;

    let status = fx.orchestrator.status("demo").await.unwrap();
    assert!(status.configured);
    assert!(status.connected);
    assert!(!status.debugging);
    assert_eq!(
        fx.orchestrator.sessions.read().await.get("demo").map(|f| f.state()),
        Some(ForwardState::Forwarding)
    );
}
