// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! each one in its own task. Every connection carries exactly one request
//! and one response.

mod apps;
mod sessions;

use std::sync::Arc;
use std::time::Instant;

use mirage_adapters::{Cluster, TunnelDialer};
use mirage_engine::{Orchestrator, OrchestratorError};
use mirage_storage::{AppRegistry, RegistryError};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::env::{ipc_timeout, PROTOCOL_VERSION};
use crate::protocol::{self, Request, Response};

/// Shared daemon context for all request handlers.
pub struct ListenCtx<C, D: TunnelDialer, R> {
    pub orchestrator: Arc<Orchestrator<C, D, R>>,
    pub shutdown: Arc<Notify>,
    pub start_time: Instant,
}

/// Listener task for accepting socket connections.
pub struct Listener<C, D: TunnelDialer, R> {
    unix: UnixListener,
    ctx: Arc<ListenCtx<C, D, R>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl<C, D, R> Listener<C, D, R>
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx<C, D, R>>) -> Self {
        Self { unix, ctx }
    }

    /// Run the listener loop, spawning a task per connection.
    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("Unix accept error: {}", e),
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected")
        }
        ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
            warn!("Connection timeout")
        }
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection.
///
/// Quick requests race the handler against client disconnect so an
/// abandoned request stops early. Long-running orchestrator requests run to
/// completion even if the client goes away: the per-app state they write
/// must stay consistent.
pub(crate) async fn handle_connection<C, D, R, Rd, Wr>(
    mut reader: Rd,
    mut writer: Wr,
    ctx: &ListenCtx<C, D, R>,
) -> Result<(), ConnectionError>
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
    Rd: AsyncRead + Unpin + Send + 'static,
    Wr: AsyncWrite + Unpin + Send + 'static,
{
    let request = protocol::read_request(&mut reader, ipc_timeout()).await?;

    if matches!(request, Request::Ping | Request::AppStatus { .. } | Request::ListApps) {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    let response = if request.is_long_running() {
        handle_request(request, ctx).await
    } else {
        tokio::select! {
            response = handle_request(request, ctx) => response,
            _ = detect_client_disconnect(&mut reader) => {
                debug!("Client disconnected, cancelling handler");
                return Ok(());
            }
        }
    };

    debug!("Sending response: {:?}", response);
    protocol::write_response(&mut writer, &response, ipc_timeout()).await?;
    Ok(())
}

/// Detect client disconnect by reading from the socket after the request.
///
/// The client sends one request then waits, so a read only completes when
/// the client hangs up.
async fn detect_client_disconnect<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Handle a single request and return a response.
pub(crate) async fn handle_request<C, D, R>(request: Request, ctx: &ListenCtx<C, D, R>) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "client version mismatch");
            }
            Response::Hello { version: PROTOCOL_VERSION.to_string() }
        }

        Request::CreateApp { app } => apps::create(ctx, app),
        Request::GetApp { name } => apps::get(ctx, &name),
        Request::UpdateApp { app } => apps::update(ctx, app),
        Request::DeleteApp { name } => apps::delete(ctx, &name).await,
        Request::ListApps => apps::list(ctx),

        Request::AppStatus { name } => sessions::status(ctx, &name).await,
        Request::InitRemote { name } => sessions::init_remote(ctx, &name).await,
        Request::StartDebugging { name } => sessions::start_debugging(ctx, &name).await,
        Request::Rollback { name } => sessions::rollback(ctx, &name).await,
        Request::StopSession { name } => sessions::stop(ctx, &name).await,

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

fn registry_error(e: RegistryError) -> Response {
    let configuration = matches!(
        e,
        RegistryError::NotFound(_) | RegistryError::AlreadyExists(_) | RegistryError::Invalid(_)
    );
    Response::Error { message: e.to_string(), configuration }
}

fn orchestrator_error(e: OrchestratorError) -> Response {
    Response::Error { message: e.to_string(), configuration: e.is_configuration() }
}

#[cfg(test)]
mod test_fixtures;

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
