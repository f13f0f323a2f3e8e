// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Cluster`] over a live API server.

use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::{Pod, PodTemplateSpec};
use kube::api::{Api, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use mirage_core::WorkloadType;

use super::forward::KubeTunnelDialer;
use super::{exec, Cluster, ContainerRef, ExecOptions, ExecOutput, KubeError, WorkloadRef};

#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Connect using an explicit kubeconfig, or the standard inference chain
    /// (`KUBECONFIG`, `~/.kube/config`, in-cluster) when `kubeconfig` is unset.
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self, KubeError> {
        let client = match kubeconfig {
            Some(path) => {
                let raw = Kubeconfig::read_from(path).map_err(|e| {
                    KubeError::Client(format!("reading {}: {e}", path.display()))
                })?;
                let config = Config::from_custom_kubeconfig(raw, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| KubeError::Client(e.to_string()))?;
                Client::try_from(config).map_err(|e| KubeError::Client(e.to_string()))?
            }
            None => Client::try_default().await.map_err(|e| KubeError::Client(e.to_string()))?,
        };
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// A tunnel dialer sharing this cluster's client.
    pub fn dialer(&self) -> KubeTunnelDialer {
        KubeTunnelDialer::new(self.client.clone())
    }
}

#[async_trait]
impl Cluster for KubeCluster {
    async fn pod_template(&self, workload: &WorkloadRef) -> Result<PodTemplateSpec, KubeError> {
        let template = match workload.kind {
            WorkloadType::Deployment => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), &workload.namespace);
                api.get(&workload.name).await?.spec.map(|s| s.template)
            }
            WorkloadType::DaemonSet => {
                let api: Api<DaemonSet> = Api::namespaced(self.client.clone(), &workload.namespace);
                api.get(&workload.name).await?.spec.map(|s| s.template)
            }
        };
        template.ok_or_else(|| KubeError::Request(format!("{workload} has no spec")))
    }

    async fn replace_pod_template(
        &self,
        workload: &WorkloadRef,
        template: PodTemplateSpec,
    ) -> Result<(), KubeError> {
        let pp = PostParams::default();
        let missing = || KubeError::Request(format!("{workload} has no spec"));
        match workload.kind {
            WorkloadType::Deployment => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), &workload.namespace);
                let mut current = api.get(&workload.name).await?;
                current.spec.as_mut().ok_or_else(missing)?.template = template;
                api.replace(&workload.name, &pp, &current).await?;
            }
            WorkloadType::DaemonSet => {
                let api: Api<DaemonSet> = Api::namespaced(self.client.clone(), &workload.namespace);
                let mut current = api.get(&workload.name).await?;
                current.spec.as_mut().ok_or_else(missing)?.template = template;
                api.replace(&workload.name, &pp, &current).await?;
            }
        }
        tracing::info!(%workload, "pod template replaced");
        Ok(())
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>, KubeError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().labels(selector);
        Ok(pods.list(&lp).await?.items)
    }

    async fn exec(
        &self,
        target: &ContainerRef,
        command: Vec<String>,
        options: ExecOptions,
    ) -> Result<ExecOutput, KubeError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &target.namespace);
        exec::run(&pods, target, command, options).await
    }
}
