// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod location: newest matching pod, and waiting for it to run.

use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use tokio::time::Instant;

use super::{Cluster, KubeError};

/// Poll interval and overall deadline for [`wait_for_running`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodWait {
    pub interval: Duration,
    pub timeout: Duration,
    /// Sleep one interval before the first poll (a rollout was just triggered).
    pub delay_first_poll: bool,
}

impl Default for PodWait {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: Duration::from_secs(60),
            delay_first_poll: false,
        }
    }
}

/// Most recently created pod that is not terminating.
pub fn newest_pod(pods: Vec<Pod>) -> Option<Pod> {
    pods.into_iter()
        .filter(|p| p.metadata.deletion_timestamp.is_none())
        .max_by_key(|p| p.metadata.creation_timestamp.as_ref().map(|t| t.0))
}

/// Newest pod in `namespace` matching `selector`.
pub async fn find_active_pod<C: Cluster>(
    cluster: &C,
    namespace: &str,
    selector: &str,
) -> Result<Pod, KubeError> {
    let pods = cluster.list_pods(namespace, selector).await?;
    newest_pod(pods).ok_or_else(|| KubeError::NoPodFound { selector: selector.to_string() })
}

/// Poll until the newest matching pod is running; returns its name.
///
/// Each failed poll is remembered. When the deadline passes, the last
/// recorded failure is returned (e.g. an image pull back-off), falling back
/// to [`KubeError::PodWaitTimeout`] only if no poll ever completed.
pub async fn wait_for_running<C: Cluster>(
    cluster: &C,
    namespace: &str,
    selector: &str,
    wait: PodWait,
) -> Result<String, KubeError> {
    let deadline = Instant::now() + wait.timeout;
    let mut last_error = None;

    if wait.delay_first_poll {
        tokio::time::sleep_until(deadline.min(Instant::now() + wait.interval)).await;
    }

    loop {
        match tokio::time::timeout_at(deadline, probe(cluster, namespace, selector)).await {
            Ok(Ok(pod)) => {
                tracing::info!(%namespace, %pod, "pod running");
                return Ok(pod);
            }
            Ok(Err(e)) => {
                tracing::debug!(%namespace, %selector, error = %e, "pod not ready yet");
                last_error = Some(e);
            }
            Err(_) => break,
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        tokio::time::sleep_until(deadline.min(now + wait.interval)).await;
    }

    let err = last_error.unwrap_or(KubeError::PodWaitTimeout(wait.timeout));
    tracing::warn!(%namespace, %selector, error = %err, "gave up waiting for pod");
    Err(err)
}

async fn probe<C: Cluster>(cluster: &C, namespace: &str, selector: &str) -> Result<String, KubeError> {
    let pod = find_active_pod(cluster, namespace, selector).await?;
    let name = pod.metadata.name.clone().unwrap_or_default();
    let status = pod.status.as_ref();
    let phase = status.and_then(|s| s.phase.clone()).unwrap_or_else(|| "Unknown".to_string());
    if phase == "Running" {
        return Ok(name);
    }
    let reason = status
        .and_then(|s| s.container_statuses.as_ref())
        .into_iter()
        .flatten()
        .filter_map(|cs| cs.state.as_ref()?.waiting.as_ref())
        .find_map(|w| match (&w.reason, &w.message) {
            (Some(r), Some(m)) => Some(format!("{r}: {m}")),
            (Some(r), None) => Some(r.clone()),
            (None, m) => m.clone(),
        });
    Err(KubeError::PodNotRunning { pod: name, phase, reason })
}

#[cfg(test)]
#[path = "pods_tests.rs"]
mod tests;
