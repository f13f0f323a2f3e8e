// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use clap::Parser;
use mirage_core::{Arch, DebugToolSource, ProgramType, WorkloadType};
use yare::parameterized;

use super::*;

#[derive(Parser)]
struct Wrapper {
    #[command(flatten)]
    create: CreateArgs,
}

fn parse(args: &[&str]) -> Result<CreateArgs, clap::Error> {
    let argv = std::iter::once("create").chain(args.iter().copied());
    Wrapper::try_parse_from(argv).map(|w| w.create)
}

fn build(args: &[&str]) -> App {
    app_from_args(parse(args).unwrap(), Path::new("/home/dev")).unwrap()
}

#[test]
fn defaults_follow_app_name() {
    let app = build(&["demo", "--build-output", "bin/demo"]);

    assert_eq!(app.name, "demo");
    assert_eq!(app.program_type, ProgramType::Go);
    assert_eq!(app.remote_runtime.namespace, "default");
    assert_eq!(app.remote_runtime.workload_type, WorkloadType::Deployment);
    assert_eq!(app.remote_runtime.workload_name, "demo");
    assert_eq!(app.remote_runtime.container_name, None);
    assert_eq!(app.remote_runtime.target_arch, Arch::Amd64);
    assert!(app.remote_config.is_none());

    let local = app.local_config.unwrap();
    assert_eq!(local.working_dir, PathBuf::from("/home/dev/."));
    assert_eq!(local.build_output, PathBuf::from("bin/demo"));
    assert_eq!(local.debug_tool_builder.unwrap().source, DebugToolSource::Local);
}

#[test]
fn explicit_flags_are_carried() {
    let app = build(&[
        "checkout",
        "--type",
        "rust",
        "--namespace",
        "shop",
        "--kind",
        "ds",
        "--workload",
        "checkout-agent",
        "--container",
        "agent",
        "--arch",
        "arm64",
        "--working-dir",
        "/src/checkout",
        "--build-output",
        "target/aarch64-unknown-linux-gnu/debug/checkout",
        "--args",
        "--verbose",
        "--build-command",
        "make debug",
        "--tool-source",
        "remote",
        "--tool-command",
        "apk add gdb",
        "--tool-command",
        "cp /usr/bin/gdbserver $MIRAGE_TOOL_DEST",
    ]);

    assert_eq!(app.program_type, ProgramType::Rust);
    assert_eq!(app.remote_runtime.namespace, "shop");
    assert_eq!(app.remote_runtime.workload_type, WorkloadType::DaemonSet);
    assert_eq!(app.remote_runtime.workload_name, "checkout-agent");
    assert_eq!(app.remote_runtime.container_name.as_deref(), Some("agent"));
    assert_eq!(app.remote_runtime.target_arch, Arch::Arm64);

    let local = app.local_config.unwrap();
    assert_eq!(local.working_dir, PathBuf::from("/src/checkout"));
    assert_eq!(local.app_args, "--verbose");
    assert_eq!(local.custom_build_command.as_deref(), Some("make debug"));
    let builder = local.debug_tool_builder.unwrap();
    assert_eq!(builder.source, DebugToolSource::Remote);
    assert_eq!(builder.build_commands.len(), 2);
}

#[test]
fn port_creates_remote_config() {
    let app = build(&["demo", "--build-output", "bin/demo", "--port", "52000", "--no-modify"]);

    let remote = app.remote_config.unwrap();
    assert_eq!(remote.remote_debugging_port, 52000);
    assert!(remote.no_modify_config);
    assert_eq!(remote.debug_tool_path, "/tmp/debug-tool");
    assert_eq!(remote.remote_app_location, "/tmp");
}

#[parameterized(
    no_modify_without_port = { &["demo", "--build-output", "bin/demo", "--no-modify"] },
    missing_build_output = { &["demo"] },
    missing_name = { &["--build-output", "bin/demo"] },
    bad_program_type = { &["demo", "--build-output", "bin/demo", "--type", "java"] },
    bad_arch = { &["demo", "--build-output", "bin/demo", "--arch", "s390x"] },
)]
fn invalid_flags_are_rejected(args: &[&str]) {
    assert!(parse(args).is_err());
}

#[test]
fn file_flag_skips_required_fields() {
    let args = parse(&["--file", "app.json"]).unwrap();
    assert_eq!(args.file, Some(PathBuf::from("app.json")));
    assert!(args.name.is_none());
}

#[test]
fn read_app_file_parses_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.json");
    let app = mirage_core::test_support::demo_app("demo");
    std::fs::write(&path, serde_json::to_string(&app).unwrap()).unwrap();

    assert_eq!(read_app_file(&path).unwrap(), app);
}

#[test]
fn read_app_file_reports_path_on_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = read_app_file(&path).unwrap_err();

    assert!(err.to_string().contains("app.json"));
}
