// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shape of requests.

use mirage_core::{Arch, ProgramType, WorkloadType};

use super::*;

#[test]
fn create_app_accepts_minimal_record() {
    let json = r#"{
        "type": "CreateApp",
        "app": {
            "name": "demo",
            "program_type": "go",
            "remote_runtime": {
                "namespace": "default",
                "workload_type": "deployment",
                "workload_name": "demo"
            }
        }
    }"#;
    let decoded: Request = serde_json::from_str(json).expect("deserialize failed");
    match decoded {
        Request::CreateApp { app } => {
            assert_eq!(app.program_type, ProgramType::Go);
            assert_eq!(app.remote_runtime.workload_type, WorkloadType::Deployment);
            assert_eq!(app.remote_runtime.target_arch, Arch::Amd64);
            assert!(app.remote_runtime.container_name.is_none());
            assert!(app.local_config.is_none());
            assert!(app.remote_config.is_none());
        }
        _ => panic!("Expected CreateApp request"),
    }
}

#[test]
fn unit_requests_are_bare_tags() {
    assert_eq!(serde_json::to_string(&Request::ListApps).unwrap(), r#"{"type":"ListApps"}"#);
    assert_eq!(serde_json::to_string(&Request::Shutdown).unwrap(), r#"{"type":"Shutdown"}"#);
}

#[yare::parameterized(
    init = { Request::InitRemote { name: "a".into() }, true },
    start = { Request::StartDebugging { name: "a".into() }, true },
    rollback = { Request::Rollback { name: "a".into() }, false },
    status = { Request::AppStatus { name: "a".into() }, false },
    ping = { Request::Ping, false },
)]
fn long_running_requests(request: Request, expected: bool) {
    assert_eq!(request.is_long_running(), expected);
}
