// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App registry specs (daemon auto-started, no cluster calls)

use crate::prelude::*;

#[test]
fn app_create_list_get_delete() {
    let temp = Project::empty();

    let out = temp
        .mirage()
        .args(&["app", "create", "demo", "--build-output", "bin/demo", "--entry", "./cmd/demo"])
        .passes()
        .stdout();
    similar_asserts::assert_eq!(out, "App 'demo' created\n");

    let out = temp.mirage().args(&["app", "list"]).passes().stdout();
    similar_asserts::assert_eq!(
        out,
        "NAME  TYPE  NAMESPACE  WORKLOAD         PORT\n\
         demo  go    default    deployment/demo  -\n"
    );

    let app = temp.mirage().args(&["app", "get", "demo", "-o", "json"]).passes().json();
    assert_eq!(app["name"], "demo");
    assert_eq!(app["program_type"], "go");
    assert_eq!(app["remote_runtime"]["workload_name"], "demo");
    assert!(app["local_config"]["working_dir"].as_str().unwrap().starts_with('/'));

    temp.mirage().args(&["app", "delete", "demo"]).passes();
    let out = temp.mirage().args(&["app", "list"]).passes().stdout();
    similar_asserts::assert_eq!(out, "No apps registered.\n");
}

#[test]
fn duplicate_create_is_a_configuration_error() {
    let temp = Project::empty();
    let create = ["app", "create", "demo", "--build-output", "bin/demo"];
    temp.mirage().args(&create).passes();

    let err = temp.mirage().args(&create).exits(2).stderr();

    assert!(err.contains("demo"), "{err}");
}

#[test]
fn get_unknown_app_is_a_configuration_error() {
    let temp = Project::empty();
    temp.mirage().args(&["app", "get", "ghost"]).exits(2);
}

#[test]
fn app_record_is_persisted_under_config_dir() {
    let temp = Project::empty();
    temp.mirage().args(&["app", "create", "demo", "--build-output", "bin/demo"]).passes();

    assert!(temp.config_dir().join("apps/demo.json").exists());
}
