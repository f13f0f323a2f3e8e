// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised local⇄pod port-forward tunnels.
//!
//! ```text
//! Stopped ──start()──▶ Connecting ──dial ok──▶ Forwarding
//!                         ▲   │ dial err            │ serve err
//!                         │   └── sleep(connect) ◀──┤
//!                         └────── sleep(reconnect) ◀┘
//! any state ──stop()──▶ Stopped
//! ```
//!
//! Tunnels are always rebuilt from scratch; a failed tunnel is never resumed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::Api;
use kube::Client;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use super::KubeError;

/// Pod liveness re-check period while a tunnel is idle.
const POD_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Where a tunnel forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    pub namespace: String,
    pub pod: String,
    pub local_port: u16,
    pub remote_port: u16,
}

/// Opens tunnels. Implemented over the pod `portforward` subresource by
/// [`KubeTunnelDialer`].
#[async_trait]
pub trait TunnelDialer: Clone + Send + Sync + 'static {
    type Tunnel: Tunnel;

    /// Establish a tunnel; fails if the local port or the pod is unavailable.
    async fn dial(&self, target: &ForwardTarget) -> Result<Self::Tunnel, KubeError>;
}

/// An established tunnel.
#[async_trait]
pub trait Tunnel: Send + 'static {
    /// Forward traffic until the tunnel breaks. Dropping the future releases it.
    async fn serve(self) -> Result<(), KubeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardState {
    Stopped,
    Connecting,
    Forwarding,
}

/// Waits between tunnel attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardBackoff {
    /// After a failed dial.
    pub connect: Duration,
    /// After an established tunnel broke.
    pub reconnect: Duration,
}

impl Default for ForwardBackoff {
    fn default() -> Self {
        Self { connect: Duration::from_secs(5), reconnect: Duration::from_secs(3) }
    }
}

/// Keeps one tunnel alive for a target until stopped.
pub struct PortForwarder<D: TunnelDialer> {
    dialer: D,
    target: ForwardTarget,
    backoff: ForwardBackoff,
    state: Arc<Mutex<ForwardState>>,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl<D: TunnelDialer> PortForwarder<D> {
    pub fn new(dialer: D, target: ForwardTarget, backoff: ForwardBackoff) -> Self {
        Self {
            dialer,
            target,
            backoff,
            state: Arc::new(Mutex::new(ForwardState::Stopped)),
            task: Mutex::new(None),
        }
    }

    /// Begin supervising in the background. Calling it again while running is a no-op.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        *self.state.lock() = ForwardState::Connecting;
        let handle = tokio::spawn(supervise(
            self.dialer.clone(),
            self.target.clone(),
            self.backoff,
            Arc::clone(&self.state),
            cancel.clone(),
        ));
        *task = Some((cancel, handle));
    }

    /// Stop supervising and wait until the tunnel is released. Idempotent.
    pub async fn stop(&self) {
        let running = self.task.lock().take();
        if let Some((cancel, handle)) = running {
            cancel.cancel();
            if let Err(e) = handle.await {
                tracing::warn!(pod = %self.target.pod, error = %e, "port-forward task ended abnormally");
            }
        }
        *self.state.lock() = ForwardState::Stopped;
    }

    pub fn pod_name(&self) -> &str {
        &self.target.pod
    }

    pub fn local_port(&self) -> u16 {
        self.target.local_port
    }

    pub fn target(&self) -> &ForwardTarget {
        &self.target
    }

    pub fn state(&self) -> ForwardState {
        *self.state.lock()
    }
}

async fn supervise<D: TunnelDialer>(
    dialer: D,
    target: ForwardTarget,
    backoff: ForwardBackoff,
    state: Arc<Mutex<ForwardState>>,
    cancel: CancellationToken,
) {
    let pod = &target.pod;
    let port = target.local_port;
    loop {
        *state.lock() = ForwardState::Connecting;
        let dialed = tokio::select! {
            _ = cancel.cancelled() => break,
            dialed = dialer.dial(&target) => dialed,
        };

        let wait = match dialed {
            Ok(tunnel) => {
                *state.lock() = ForwardState::Forwarding;
                tracing::info!(%pod, port, remote_port = target.remote_port, "port-forward established");
                let served = tokio::select! {
                    _ = cancel.cancelled() => break,
                    served = tunnel.serve() => served,
                };
                match served {
                    Ok(()) => tracing::warn!(%pod, port, "port-forward closed, reconnecting"),
                    Err(e) => tracing::warn!(%pod, port, error = %e, "port-forward broke, reconnecting"),
                }
                backoff.reconnect
            }
            Err(e) => {
                tracing::warn!(%pod, port, error = %e, "port-forward dial failed");
                backoff.connect
            }
        };

        *state.lock() = ForwardState::Connecting;
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }
    *state.lock() = ForwardState::Stopped;
    tracing::info!(%pod, port, "port-forward stopped");
}

/// Dials tunnels through the pod `portforward` subresource.
#[derive(Clone)]
pub struct KubeTunnelDialer {
    client: Client,
}

impl KubeTunnelDialer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TunnelDialer for KubeTunnelDialer {
    type Tunnel = KubeTunnel;

    async fn dial(&self, target: &ForwardTarget) -> Result<KubeTunnel, KubeError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &target.namespace);
        check_pod(&pods, &target.pod).await?;
        let listener = TcpListener::bind(("0.0.0.0", target.local_port))
            .await
            .map_err(|e| KubeError::Forward(format!("bind 0.0.0.0:{}: {e}", target.local_port)))?;
        Ok(KubeTunnel { pods, pod: target.pod.clone(), remote_port: target.remote_port, listener })
    }
}

/// A bound local listener relaying each accepted connection to the pod.
pub struct KubeTunnel {
    pods: Api<Pod>,
    pod: String,
    remote_port: u16,
    listener: TcpListener,
}

#[async_trait]
impl Tunnel for KubeTunnel {
    async fn serve(self) -> Result<(), KubeError> {
        let mut connections = JoinSet::new();
        let mut check = tokio::time::interval(POD_CHECK_INTERVAL);
        check.tick().await;
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    tracing::debug!(pod = %self.pod, %peer, "forwarding connection");
                    let forwarder = self.pods.portforward(&self.pod, &[self.remote_port]).await?;
                    connections.spawn(relay(stream, forwarder, self.remote_port, self.pod.clone()));
                }
                _ = check.tick() => check_pod(&self.pods, &self.pod).await?,
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        tracing::debug!(pod = %self.pod, error = %e, "relay task aborted");
                    }
                }
            }
        }
    }
}

async fn relay(mut local: TcpStream, mut forwarder: kube::api::Portforwarder, port: u16, pod: String) {
    let Some(mut upstream) = forwarder.take_stream(port) else {
        tracing::warn!(%pod, port, "port-forward stream unavailable");
        return;
    };
    if let Err(e) = tokio::io::copy_bidirectional(&mut local, &mut upstream).await {
        tracing::debug!(%pod, port, error = %e, "relay ended");
    }
    drop(upstream);
    if let Err(e) = forwarder.join().await {
        tracing::debug!(%pod, port, error = %e, "port-forward session closed with error");
    }
}

async fn check_pod(pods: &Api<Pod>, name: &str) -> Result<(), KubeError> {
    let pod = pods.get(name).await?;
    let phase = pod.status.and_then(|s| s.phase).unwrap_or_default();
    if pod.metadata.deletion_timestamp.is_some() || phase != "Running" {
        return Err(KubeError::PodNotRunning { pod: name.to_string(), phase, reason: None });
    }
    Ok(())
}

#[cfg(test)]
#[path = "forward_tests.rs"]
mod tests;
