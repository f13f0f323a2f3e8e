// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for protocol serde roundtrips.

use mirage_core::test_support::demo_app;
use mirage_core::AppStatus;
use proptest::prelude::*;

use super::*;

fn all_requests(name: &str) -> Vec<Request> {
    let n = || name.to_string();
    vec![
        Request::Ping,
        Request::Hello { version: n() },
        Request::CreateApp { app: demo_app("demo") },
        Request::GetApp { name: n() },
        Request::UpdateApp { app: demo_app("demo") },
        Request::DeleteApp { name: n() },
        Request::ListApps,
        Request::AppStatus { name: n() },
        Request::InitRemote { name: n() },
        Request::StartDebugging { name: n() },
        Request::Rollback { name: n() },
        Request::StopSession { name: n() },
        Request::Shutdown,
    ]
}

fn all_responses(text: &str) -> Vec<Response> {
    vec![
        Response::Pong,
        Response::Hello { version: text.to_string() },
        Response::App { app: Box::new(demo_app("demo")) },
        Response::Apps { apps: vec![demo_app("a"), demo_app("b")] },
        Response::Status { status: AppStatus::new(text).connected(true).error(text) },
        Response::Stopped { name: text.to_string(), existed: true },
        Response::Ok,
        Response::ShuttingDown,
        Response::Error { message: text.to_string(), configuration: true },
    ]
}

proptest! {
    #[test]
    fn requests_survive_the_wire(name in "\\PC{0,40}") {
        for request in all_requests(&name) {
            let decoded: Request = decode(&encode(&request).unwrap()).unwrap();
            prop_assert_eq!(decoded, request);
        }
    }

    #[test]
    fn responses_survive_the_wire(text in "\\PC{0,40}") {
        for response in all_responses(&text) {
            let decoded: Response = decode(&encode(&response).unwrap()).unwrap();
            prop_assert_eq!(decoded, response);
        }
    }
}
