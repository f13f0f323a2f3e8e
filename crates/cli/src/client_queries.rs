// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed request methods for DaemonClient.

use mirage_core::{App, AppStatus};
use mirage_daemon::env::PROTOCOL_VERSION;
use mirage_daemon::{Request, Response};

use crate::client::{ClientError, DaemonClient};

impl DaemonClient {
    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Self::reject(other),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello { version: PROTOCOL_VERSION.to_string() };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    pub async fn create_app(&self, app: App) -> Result<App, ClientError> {
        match self.send(&Request::CreateApp { app }).await? {
            Response::App { app } => Ok(*app),
            other => Self::reject(other),
        }
    }

    pub async fn get_app(&self, name: &str) -> Result<App, ClientError> {
        match self.send(&Request::GetApp { name: name.to_string() }).await? {
            Response::App { app } => Ok(*app),
            other => Self::reject(other),
        }
    }

    pub async fn list_apps(&self) -> Result<Vec<App>, ClientError> {
        match self.send(&Request::ListApps).await? {
            Response::Apps { apps } => Ok(apps),
            other => Self::reject(other),
        }
    }

    /// Delete an app, returning the removed record.
    pub async fn delete_app(&self, name: &str) -> Result<App, ClientError> {
        match self.send(&Request::DeleteApp { name: name.to_string() }).await? {
            Response::App { app } => Ok(*app),
            other => Self::reject(other),
        }
    }

    pub async fn app_status(&self, name: &str) -> Result<AppStatus, ClientError> {
        self.status_request(Request::AppStatus { name: name.to_string() }).await
    }

    pub async fn init_remote(&self, name: &str) -> Result<AppStatus, ClientError> {
        self.status_request(Request::InitRemote { name: name.to_string() }).await
    }

    pub async fn start_debugging(&self, name: &str) -> Result<AppStatus, ClientError> {
        self.status_request(Request::StartDebugging { name: name.to_string() }).await
    }

    pub async fn rollback(&self, name: &str) -> Result<AppStatus, ClientError> {
        self.status_request(Request::Rollback { name: name.to_string() }).await
    }

    /// Stop an app's tunnel. Returns whether one was running.
    pub async fn stop_session(&self, name: &str) -> Result<bool, ClientError> {
        match self.send(&Request::StopSession { name: name.to_string() }).await? {
            Response::Stopped { existed, .. } => Ok(existed),
            other => Self::reject(other),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }

    async fn status_request(&self, request: Request) -> Result<AppStatus, ClientError> {
        match self.send(&request).await? {
            Response::Status { status } => Ok(status),
            other => Self::reject(other),
        }
    }
}
