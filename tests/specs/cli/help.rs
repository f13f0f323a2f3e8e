// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and argument validation specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    let temp = Project::empty();
    let out = temp.mirage().args(&["--help"]).passes().stdout();

    for command in ["app", "debug", "status", "rollback", "stop", "daemon"] {
        assert!(out.contains(command), "missing {command} in:\n{out}");
    }
}

#[test]
fn version_matches_package() {
    let temp = Project::empty();
    let out = temp.mirage().args(&["--version"]).passes().stdout();

    similar_asserts::assert_eq!(out.trim(), format!("mirage-debug {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn create_without_build_output_is_a_usage_error() {
    let temp = Project::empty();
    let err = temp.mirage().args(&["app", "create", "demo"]).exits(2).stderr();

    assert!(err.contains("--build-output"), "{err}");
}

#[test]
fn unknown_program_type_is_rejected() {
    let temp = Project::empty();
    let err = temp
        .mirage()
        .args(&["app", "create", "demo", "--build-output", "bin/demo", "--type", "java"])
        .exits(2)
        .stderr();

    assert!(err.contains("unknown ProgramType 'java'"), "{err}");
}
