// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serial_test::serial;

use super::*;

#[test]
fn parse_startup_error_finds_reason() {
    let log = "\
2026-01-01T00:00:00Z  INFO mirage_debugd: Starting daemon version=0.2.0
2026-01-01T00:00:01Z ERROR mirage_debugd: Startup failed: Failed to acquire lock: daemon already running?
";
    let err = parse_startup_error(log).unwrap();
    assert_eq!(err, "Failed to acquire lock: daemon already running?");
}

#[test]
fn parse_startup_error_no_error() {
    let log = "\
2026-01-01T00:00:00Z  INFO mirage_debugd: Starting daemon version=0.2.0
2026-01-01T00:00:00Z  INFO mirage_daemon::lifecycle::startup: Daemon started
";
    assert!(parse_startup_error(log).is_none());
}

#[test]
fn parse_startup_error_multiple_startups_picks_last() {
    let log = "\
INFO Starting daemon
ERROR Startup failed: first failure
INFO Starting daemon
ERROR Startup failed: second failure
";
    assert_eq!(parse_startup_error(log).unwrap(), "second failure");
}

#[test]
fn parse_startup_error_ignores_failure_before_last_start() {
    let log = "\
INFO Starting daemon
ERROR Startup failed: old failure
INFO Starting daemon
INFO Daemon started
";
    assert!(parse_startup_error(log).is_none());
}

#[test]
fn parse_startup_error_no_marker() {
    assert!(parse_startup_error("some random log content\n").is_none());
}

#[test]
#[serial]
fn find_daemon_binary_prefers_env_override() {
    std::env::set_var("MIRAGE_DAEMON_BINARY", "/opt/mirage/bin/mirage-debugd");
    let path = find_daemon_binary();
    std::env::remove_var("MIRAGE_DAEMON_BINARY");
    assert_eq!(path, PathBuf::from("/opt/mirage/bin/mirage-debugd"));
}

#[test]
fn read_startup_error_missing_log_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_startup_error(&dir.path().join("daemon.log")).is_none());
}
