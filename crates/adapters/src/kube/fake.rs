// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory cluster and tunnel dialer for tests

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, PodStatus, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::time::Instant;

use super::forward::{ForwardTarget, Tunnel, TunnelDialer};
use super::{Cluster, ContainerRef, ExecOptions, ExecOutput, KubeError, WorkloadRef};

/// Build a pod with labels, a creation time (seconds since epoch), and a phase.
pub fn fake_pod(name: &str, labels: &[(&str, &str)], created_secs: i64, phase: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()),
            creation_timestamp: Some(Time(
                chrono::DateTime::from_timestamp(created_secs, 0).unwrap_or_default(),
            )),
            ..Default::default()
        },
        status: Some(PodStatus { phase: Some(phase.to_string()), ..Default::default() }),
        ..Default::default()
    }
}

/// Recorded cluster call
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterCall {
    PodTemplate(WorkloadRef),
    ReplacePodTemplate(WorkloadRef),
    ListPods { namespace: String, selector: String },
    Exec { target: ContainerRef, command: Vec<String>, stdin: Option<Vec<u8>> },
}

struct ExecRule {
    needle: String,
    effect: ExecEffect,
}

enum ExecEffect {
    Fail { code: i32, stderr: String },
    Hold,
    Stdout(String),
}

struct ClusterState {
    templates: HashMap<WorkloadRef, PodTemplateSpec>,
    pods: Vec<(Option<WorkloadRef>, Pod)>,
    list_failures: VecDeque<String>,
    exec_rules: Vec<ExecRule>,
    rollout_phase: String,
    clock: i64,
    calls: Vec<ClusterCall>,
}

impl ClusterState {
    fn rollout(&mut self, workload: &WorkloadRef, template: &PodTemplateSpec) {
        self.pods.retain(|(owner, _)| owner.as_ref() != Some(workload));
        self.clock += 1;
        let labels: Vec<(String, String)> = template
            .metadata
            .as_ref()
            .and_then(|m| m.labels.clone())
            .unwrap_or_default()
            .into_iter()
            .collect();
        let labels: Vec<(&str, &str)> = labels.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let mut pod = fake_pod(
            &format!("{}-{}", workload.name, self.clock),
            &labels,
            self.clock,
            &self.rollout_phase,
        );
        pod.metadata.namespace = Some(workload.namespace.clone());
        self.pods.push((Some(workload.clone()), pod));
    }
}

/// Fake [`Cluster`] that keeps workloads and pods in memory.
///
/// Replacing a pod template "rolls out" a fresh pod labelled like the new
/// template, so selector-based lookups see the new pod.
#[derive(Clone)]
pub struct FakeCluster {
    inner: Arc<Mutex<ClusterState>>,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClusterState {
                templates: HashMap::new(),
                pods: Vec::new(),
                list_failures: VecDeque::new(),
                exec_rules: Vec::new(),
                rollout_phase: "Running".to_string(),
                clock: 0,
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workload and roll out its first pod.
    pub fn add_workload(&self, workload: WorkloadRef, template: PodTemplateSpec) {
        let mut inner = self.inner.lock();
        inner.rollout(&workload, &template);
        inner.templates.insert(workload, template);
    }

    /// Change a template out-of-band, without rolling out a pod.
    pub fn set_template(&self, workload: &WorkloadRef, template: PodTemplateSpec) {
        self.inner.lock().templates.insert(workload.clone(), template);
    }

    pub fn template(&self, workload: &WorkloadRef) -> Option<PodTemplateSpec> {
        self.inner.lock().templates.get(workload).cloned()
    }

    pub fn add_pod(&self, pod: Pod) {
        self.inner.lock().pods.push((None, pod));
    }

    pub fn pods(&self) -> Vec<Pod> {
        self.inner.lock().pods.iter().map(|(_, p)| p.clone()).collect()
    }

    /// Phase given to pods created by later rollouts.
    pub fn set_rollout_phase(&self, phase: &str) {
        self.inner.lock().rollout_phase = phase.to_string();
    }

    /// Make the next `times` pod list calls fail with `message`.
    pub fn fail_next_lists(&self, times: usize, message: &str) {
        let mut inner = self.inner.lock();
        inner.list_failures.extend(std::iter::repeat(message.to_string()).take(times));
    }

    /// Execs whose joined argv contains `needle` exit with `code`.
    pub fn fail_exec_matching(&self, needle: &str, code: i32, stderr: &str) {
        self.push_rule(needle, ExecEffect::Fail { code, stderr: stderr.to_string() });
    }

    /// Execs whose joined argv contains `needle` never return.
    pub fn hold_exec_matching(&self, needle: &str) {
        self.push_rule(needle, ExecEffect::Hold);
    }

    /// Execs whose joined argv contains `needle` print `stdout`.
    pub fn stdout_for_exec_matching(&self, needle: &str, stdout: &str) {
        self.push_rule(needle, ExecEffect::Stdout(stdout.to_string()));
    }

    fn push_rule(&self, needle: &str, effect: ExecEffect) {
        self.inner.lock().exec_rules.push(ExecRule { needle: needle.to_string(), effect });
    }

    pub fn calls(&self) -> Vec<ClusterCall> {
        self.inner.lock().calls.clone()
    }

    pub fn replace_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, ClusterCall::ReplacePodTemplate(_))).count()
    }

    /// Argv of every exec, in order.
    pub fn exec_commands(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ClusterCall::Exec { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    /// Stdin bytes of every exec that had one, in order.
    pub fn exec_inputs(&self) -> Vec<(Vec<String>, Vec<u8>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ClusterCall::Exec { command, stdin: Some(stdin), .. } => Some((command, stdin)),
                _ => None,
            })
            .collect()
    }
}

fn matches_selector(pod: &Pod, selector: &str) -> bool {
    let empty = BTreeMap::new();
    let labels = pod.metadata.labels.as_ref().unwrap_or(&empty);
    selector.split(',').filter(|s| !s.is_empty()).all(|pair| match pair.split_once('=') {
        Some((k, v)) => labels.get(k).is_some_and(|actual| actual == v),
        None => labels.contains_key(pair),
    })
}

#[async_trait]
impl Cluster for FakeCluster {
    async fn pod_template(&self, workload: &WorkloadRef) -> Result<PodTemplateSpec, KubeError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ClusterCall::PodTemplate(workload.clone()));
        inner
            .templates
            .get(workload)
            .cloned()
            .ok_or_else(|| KubeError::Request(format!("{workload} not found")))
    }

    async fn replace_pod_template(
        &self,
        workload: &WorkloadRef,
        template: PodTemplateSpec,
    ) -> Result<(), KubeError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ClusterCall::ReplacePodTemplate(workload.clone()));
        if !inner.templates.contains_key(workload) {
            return Err(KubeError::Request(format!("{workload} not found")));
        }
        inner.rollout(workload, &template);
        inner.templates.insert(workload.clone(), template);
        Ok(())
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>, KubeError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ClusterCall::ListPods {
            namespace: namespace.to_string(),
            selector: selector.to_string(),
        });
        if let Some(message) = inner.list_failures.pop_front() {
            return Err(KubeError::Request(message));
        }
        Ok(inner
            .pods
            .iter()
            .map(|(_, p)| p)
            .filter(|p| p.metadata.namespace.as_deref().map_or(true, |ns| ns == namespace))
            .filter(|p| matches_selector(p, selector))
            .cloned()
            .collect())
    }

    async fn exec(
        &self,
        target: &ContainerRef,
        command: Vec<String>,
        options: ExecOptions,
    ) -> Result<ExecOutput, KubeError> {
        let stdin = match options.stdin {
            Some(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes).await?;
                Some(bytes)
            }
            None => None,
        };

        let joined = command.join(" ");
        let effect = {
            let mut inner = self.inner.lock();
            inner.calls.push(ClusterCall::Exec { target: target.clone(), command, stdin });
            inner.exec_rules.iter().find(|r| joined.contains(&r.needle)).map(|r| match &r.effect {
                ExecEffect::Fail { code, stderr } => ExecEffect::Fail { code: *code, stderr: stderr.clone() },
                ExecEffect::Hold => ExecEffect::Hold,
                ExecEffect::Stdout(s) => ExecEffect::Stdout(s.clone()),
            })
        };

        match effect {
            Some(ExecEffect::Hold) => std::future::pending().await,
            Some(ExecEffect::Fail { code, stderr }) => {
                Err(KubeError::ExitStatus { command: joined, code, stderr })
            }
            Some(ExecEffect::Stdout(stdout)) => {
                if let Some(live) = &options.live {
                    for line in stdout.lines() {
                        let _ = live.send(line.to_string());
                    }
                }
                Ok(ExecOutput { stdout, stderr: String::new() })
            }
            None => Ok(ExecOutput::default()),
        }
    }
}

/// Scripted result of one [`FakeTunnelDialer::dial`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialOutcome {
    /// The dial itself fails.
    Fail(String),
    /// The tunnel is established, then breaks after the given time.
    BreakAfter(Duration, String),
    /// The tunnel forwards until dropped.
    Hold,
}

#[derive(Default)]
struct DialerState {
    script: VecDeque<DialOutcome>,
    dials: Vec<(ForwardTarget, Instant)>,
    active: usize,
    max_active: usize,
}

/// Fake [`TunnelDialer`]: follows a script of outcomes (then holds), records
/// dial times, and tracks how many tunnels are alive at once.
#[derive(Clone, Default)]
pub struct FakeTunnelDialer {
    inner: Arc<Mutex<DialerState>>,
}

impl FakeTunnelDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: DialOutcome) {
        self.inner.lock().script.push_back(outcome);
    }

    pub fn dials(&self) -> Vec<(ForwardTarget, Instant)> {
        self.inner.lock().dials.clone()
    }

    pub fn dial_count(&self) -> usize {
        self.inner.lock().dials.len()
    }

    /// Tunnels currently alive.
    pub fn active(&self) -> usize {
        self.inner.lock().active
    }

    /// Most tunnels ever alive at the same time.
    pub fn max_active(&self) -> usize {
        self.inner.lock().max_active
    }
}

#[async_trait]
impl TunnelDialer for FakeTunnelDialer {
    type Tunnel = FakeTunnel;

    async fn dial(&self, target: &ForwardTarget) -> Result<FakeTunnel, KubeError> {
        let mut inner = self.inner.lock();
        inner.dials.push((target.clone(), Instant::now()));
        let outcome = inner.script.pop_front().unwrap_or(DialOutcome::Hold);
        if let DialOutcome::Fail(message) = outcome {
            return Err(KubeError::Forward(message));
        }
        inner.active += 1;
        inner.max_active = inner.max_active.max(inner.active);
        Ok(FakeTunnel { outcome, dialer: Arc::clone(&self.inner) })
    }
}

pub struct FakeTunnel {
    outcome: DialOutcome,
    dialer: Arc<Mutex<DialerState>>,
}

impl Drop for FakeTunnel {
    fn drop(&mut self) {
        let mut inner = self.dialer.lock();
        inner.active = inner.active.saturating_sub(1);
    }
}

#[async_trait]
impl Tunnel for FakeTunnel {
    async fn serve(self) -> Result<(), KubeError> {
        match &self.outcome {
            DialOutcome::BreakAfter(after, message) => {
                tokio::time::sleep(*after).await;
                Err(KubeError::Forward(message.clone()))
            }
            _ => std::future::pending().await,
        }
    }
}
