// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs
//!
//! Verify daemon start/stop/status and the not-running paths.

use crate::prelude::*;

#[test]
fn status_reports_not_running() {
    let temp = Project::empty();
    let out = temp.mirage().args(&["daemon", "status"]).passes().stdout();
    similar_asserts::assert_eq!(out, "Daemon not running\n");
}

#[test]
fn stop_when_not_running_is_not_an_error() {
    let temp = Project::empty();
    let out = temp.mirage().args(&["daemon", "stop"]).passes().stdout();
    similar_asserts::assert_eq!(out, "Daemon not running\n");
}

#[test]
fn stop_session_without_daemon_exits_not_running() {
    let temp = Project::empty();
    let err = temp.mirage().args(&["stop", "demo"]).exits(3).stderr();
    assert!(err.contains("Daemon not running"), "{err}");
}

#[test]
fn start_status_stop_cycle() {
    let temp = Project::empty();

    let out = temp.mirage().args(&["daemon", "start"]).passes().stdout();
    similar_asserts::assert_eq!(out, "Daemon started\n");
    assert!(temp.config_dir().join("daemon.sock").exists());
    assert!(temp.config_dir().join("daemon.pid").exists());

    let out = temp.mirage().args(&["daemon", "start"]).passes().stdout();
    similar_asserts::assert_eq!(out, "Daemon already running\n");

    let status = temp.mirage().args(&["daemon", "status", "-o", "json"]).passes().json();
    assert_eq!(status["status"], "running");
    assert_eq!(status["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(status["apps"], 0);

    let out = temp.mirage().args(&["daemon", "stop"]).passes().stdout();
    similar_asserts::assert_eq!(out, "Daemon stopped\n");
    assert!(!temp.config_dir().join("daemon.sock").exists());
    let pid_gone = wait_for(SPEC_WAIT_MAX_MS, || !temp.config_dir().join("daemon.pid").exists());
    assert!(pid_gone, "pid file should be removed on shutdown");
}

#[test]
fn daemon_writes_log_file() {
    let temp = Project::empty();
    temp.mirage().args(&["daemon", "start"]).passes();
    temp.mirage().args(&["daemon", "stop"]).passes();

    let log_path = temp.config_dir().join("daemon.log");
    let flushed = wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::read_to_string(&log_path).is_ok_and(|log| log.contains("Daemon shutdown complete"))
    });
    let log = std::fs::read_to_string(&log_path).unwrap_or_default();
    assert!(flushed, "shutdown should be logged:\n{log}");
    assert!(log.contains("Starting daemon"), "{log}");
}

#[test]
fn stop_session_for_idle_app_reports_no_tunnel() {
    let temp = Project::empty();
    temp.mirage().args(&["app", "create", "demo", "--build-output", "bin/demo"]).passes();

    let out = temp.mirage().args(&["stop", "demo"]).passes().stdout();
    similar_asserts::assert_eq!(out, "No tunnel running for 'demo'\n");
}
