// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client: one request per connection over the daemon socket.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use mirage_daemon::lifecycle::Config;
use mirage_daemon::protocol::{self, ProtocolError};
use mirage_daemon::{Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

use crate::daemon_process;
use crate::env::{ipc_timeout, long_request_timeout};

/// How long a freshly spawned daemon gets to answer its first ping.
const STARTUP_WAIT: Duration = Duration::from_secs(5);
const STARTUP_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Rejected { message: String, configuration: bool },

    #[error("Unexpected response from daemon: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    /// The daemon socket is missing or nobody is listening on it.
    pub fn is_not_running(&self) -> bool {
        match self {
            ClientError::DaemonNotRunning => true,
            ClientError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
            ),
            _ => false,
        }
    }

    /// The daemon rejected the request as misconfigured.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ClientError::Rejected { configuration: true, .. })
    }
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Client for the user-level daemon. Fails if its socket does not exist.
    pub fn connect() -> Result<Self, ClientError> {
        let config = Config::load().map_err(|_| ClientError::NoConfigDir)?;
        if !config.socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self::for_socket(config.socket_path))
    }

    /// Client for an explicit socket path.
    pub fn for_socket(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into() }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Connect to a responsive daemon, starting one in the background if needed.
    pub async fn connect_or_start() -> Result<Self, ClientError> {
        if let Ok(client) = Self::connect() {
            if client.ping().await.is_ok() {
                return Ok(client);
            }
        }

        let config = Config::load().map_err(|_| ClientError::NoConfigDir)?;
        daemon_process::spawn_background()?;

        let client = Self::for_socket(&config.socket_path);
        let deadline = Instant::now() + STARTUP_WAIT;
        while Instant::now() < deadline {
            if client.ping().await.is_ok() {
                return Ok(client);
            }
            tokio::time::sleep(STARTUP_POLL).await;
        }

        let reason = daemon_process::read_startup_error(&config.log_path)
            .unwrap_or_else(|| format!("no response on {}", config.socket_path.display()));
        Err(ClientError::DaemonStartFailed(reason))
    }

    /// Send one request and wait for its response.
    ///
    /// Long-running requests get the long response deadline; the request
    /// itself is always written under the normal IPC timeout.
    pub(crate) async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let response_timeout =
            if request.is_long_running() { long_request_timeout() } else { ipc_timeout() };
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();
        protocol::write_request(&mut writer, request, ipc_timeout()).await?;
        Ok(protocol::read_response(&mut reader, response_timeout).await?)
    }

    /// Map an unexpected response to an error.
    pub(crate) fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { message, configuration } => {
                Err(ClientError::Rejected { message, configuration })
            }
            other => Err(ClientError::UnexpectedResponse(format!("{other:?}"))),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
