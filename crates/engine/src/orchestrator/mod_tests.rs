// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mirage_adapters::kube::template::DEBUG_LABEL;
use mirage_adapters::WorkloadRef;
use mirage_core::test_support::{demo_app, demo_local_config};
use mirage_core::{RemoteConfig, WorkloadType};
use mirage_storage::{AppRegistry, RegistryError};

use crate::test_helpers::{demo_template, demo_workload, run_background, Fixture};
use crate::{OrchestratorError, Phase};

/// Register a second app `api` on its own deployment.
fn add_api_app(fx: &Fixture) {
    fx.cluster.add_workload(WorkloadRef::new("default", WorkloadType::Deployment, "api"), demo_template());
    let mut app = demo_app("api").local_config(demo_local_config(fx.workdir.path()));
    app.remote_runtime.workload_name = "api".to_string();
    fx.registry.create(&app).unwrap();
}

#[tokio::test]
async fn status_of_fresh_app_is_all_false() {
    let fx = Fixture::new();

    let status = fx.orchestrator.status("demo").await.unwrap();

    assert_eq!(status.app_name, "demo");
    assert!(!status.configured);
    assert!(!status.connected);
    assert!(!status.debugging);
    assert_eq!(status.error, None);
    assert_eq!(fx.orchestrator.phase("demo"), Phase::Idle);
}

#[tokio::test]
async fn status_of_unknown_app_is_not_found() {
    let fx = Fixture::new();

    let err = fx.orchestrator.status("ghost").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::Registry(RegistryError::NotFound(_))));
    assert!(err.is_configuration());
}

#[tokio::test]
async fn status_carries_cluster_error_for_missing_workload() {
    let fx = Fixture::new();
    fx.update_app(|app| app.remote_runtime.workload_name = "gone".to_string());

    let status = fx.orchestrator.status("demo").await.unwrap();

    assert!(!status.configured);
    assert!(status.error.unwrap().contains("gone"));
}

fn no_modify(fx: &Fixture) {
    fx.update_app(|app| {
        let mut remote = RemoteConfig::new("/tmp/debug-tool", "/tmp", 51000);
        remote.no_modify_config = true;
        app.remote_config = Some(remote);
    });
}

#[tokio::test]
async fn no_modify_status_reads_live_label() {
    let fx = Fixture::new();
    no_modify(&fx);
    fx.orchestrator.init_remote("demo").await.unwrap();

    let status = fx.orchestrator.status("demo").await.unwrap();

    assert!(!status.configured);
    assert_eq!(status.error, None);
}

#[tokio::test]
async fn no_modify_status_sees_label_set_by_hand() {
    let fx = Fixture::new();
    no_modify(&fx);
    let mut labelled = demo_template();
    labelled
        .metadata
        .get_or_insert_with(Default::default)
        .labels
        .get_or_insert_with(Default::default)
        .insert(DEBUG_LABEL.to_string(), "demo".to_string());
    fx.cluster.set_template(&demo_workload(), labelled);

    let status = fx.orchestrator.status("demo").await.unwrap();

    assert!(status.configured);
}

#[tokio::test]
async fn stop_session_tears_down_tunnel_once() {
    let fx = Fixture::new();
    fx.orchestrator.init_remote("demo").await.unwrap();
    run_background().await;
    assert_eq!(fx.dialer.active(), 1);

    assert!(fx.orchestrator.stop_session("demo").await);
    assert!(!fx.orchestrator.stop_session("demo").await);

    assert_eq!(fx.dialer.active(), 0);
    assert!(fx.orchestrator.session_names().await.is_empty());
    assert!(!fx.orchestrator.status("demo").await.unwrap().connected);
    assert_eq!(fx.orchestrator.phase("demo"), Phase::Idle);
}

#[tokio::test]
async fn shutdown_stops_every_tunnel() {
    let fx = Fixture::new();
    add_api_app(&fx);
    fx.orchestrator.init_remote("demo").await.unwrap();
    fx.orchestrator.init_remote("api").await.unwrap();
    run_background().await;
    assert_eq!(fx.orchestrator.session_names().await, vec!["api".to_string(), "demo".to_string()]);
    assert_eq!(fx.dialer.active(), 2);

    fx.orchestrator.shutdown().await;

    assert!(fx.orchestrator.session_names().await.is_empty());
    assert_eq!(fx.dialer.active(), 0);
}

#[tokio::test]
async fn concurrent_inits_of_one_app_are_serialized() {
    let fx = Fixture::new();

    let (a, b) = tokio::join!(fx.orchestrator.init_remote("demo"), fx.orchestrator.init_remote("demo"));
    a.unwrap();
    b.unwrap();

    assert_eq!(fx.cluster.replace_count(), 1);
    run_background().await;
    assert_eq!(fx.dialer.max_active(), 1);
}

#[tokio::test]
async fn apps_get_independent_ports_and_tunnels() {
    let fx = Fixture::new();
    add_api_app(&fx);

    let (a, b) = tokio::join!(fx.orchestrator.init_remote("demo"), fx.orchestrator.init_remote("api"));
    a.unwrap();
    b.unwrap();
    run_background().await;

    let mut pods: Vec<_> = fx.dialer.dials().into_iter().map(|(t, _)| t.pod).collect();
    pods.sort();
    assert_eq!(pods.len(), 2);
    assert!(pods[0].starts_with("api-"), "{pods:?}");
    assert!(pods[1].starts_with("demo-"), "{pods:?}");
    assert!(fx.registry.get("api").unwrap().remote_config.is_some());
}
