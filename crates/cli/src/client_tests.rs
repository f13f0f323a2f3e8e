// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use mirage_core::test_support::demo_app;
use mirage_core::AppStatus;
use mirage_daemon::protocol;
use mirage_daemon::{Request, Response};
use tempfile::TempDir;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;

use super::*;

/// Bind a socket that answers exactly one request with `response`.
fn serve_once(response: Response) -> (TempDir, DaemonClient, JoinHandle<Request>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daemon.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (mut reader, mut writer) = stream.into_split();
        let request = protocol::read_request(&mut reader, Duration::from_secs(1)).await.unwrap();
        protocol::write_response(&mut writer, &response, Duration::from_secs(1)).await.unwrap();
        request
    });
    (dir, DaemonClient::for_socket(path), handle)
}

#[tokio::test]
async fn ping_round_trips() {
    let (_dir, client, server) = serve_once(Response::Pong);

    client.ping().await.unwrap();

    assert_eq!(server.await.unwrap(), Request::Ping);
}

#[tokio::test]
async fn init_remote_returns_status() {
    let status = AppStatus::new("demo").configured(true).connected(true);
    let (_dir, client, server) = serve_once(Response::Status { status: status.clone() });

    let got = client.init_remote("demo").await.unwrap();

    assert_eq!(got, status);
    assert_eq!(server.await.unwrap(), Request::InitRemote { name: "demo".into() });
}

#[tokio::test]
async fn create_app_unboxes_record() {
    let app = demo_app("demo");
    let (_dir, client, _server) = serve_once(Response::App { app: Box::new(app.clone()) });

    assert_eq!(client.create_app(app.clone()).await.unwrap(), app);
}

#[tokio::test]
async fn error_response_becomes_rejected() {
    let (_dir, client, _server) = serve_once(Response::Error {
        message: "app 'ghost' not found".into(),
        configuration: true,
    });

    let err = client.get_app("ghost").await.unwrap_err();

    assert!(err.is_configuration());
    assert_eq!(err.to_string(), "app 'ghost' not found");
}

#[tokio::test]
async fn mismatched_response_is_unexpected() {
    let (_dir, client, _server) = serve_once(Response::Pong);

    let err = client.stop_session("demo").await.unwrap_err();

    assert!(matches!(err, ClientError::UnexpectedResponse(_)));
    assert!(!err.is_configuration());
}

#[tokio::test]
async fn missing_socket_reads_as_not_running() {
    let dir = tempfile::tempdir().unwrap();
    let client = DaemonClient::for_socket(dir.path().join("daemon.sock"));

    let err = client.ping().await.unwrap_err();

    assert!(err.is_not_running(), "got {err:?}");
}
