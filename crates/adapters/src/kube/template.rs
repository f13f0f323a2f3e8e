// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debug-shape computation over pod templates. No I/O.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, PodTemplateSpec};

use super::KubeError;

/// Label marking a pod template as configured for debugging; value is the app name.
pub const DEBUG_LABEL: &str = "miragedebug.io/debug";

/// Remote file the idle entrypoint tails and the debuggee appends to.
pub const DEBUG_OUTPUT: &str = "/tmp/mirage-debug-output";

/// Entrypoint that keeps the container alive without starting the app.
pub fn idle_command() -> (Vec<String>, Vec<String>) {
    (
        vec!["/bin/sh".to_string()],
        vec!["-c".to_string(), format!("touch {DEBUG_OUTPUT}; tail -f {DEBUG_OUTPUT}")],
    )
}

fn containers(template: &PodTemplateSpec) -> &[Container] {
    template.spec.as_ref().map(|s| s.containers.as_slice()).unwrap_or_default()
}

/// Resolve the target container: `name` if given, else the first container.
pub fn resolve_container(
    template: &PodTemplateSpec,
    name: Option<&str>,
) -> Result<String, KubeError> {
    let containers = containers(template);
    match name.filter(|n| !n.is_empty()) {
        Some(name) => containers
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.name.clone())
            .ok_or_else(|| KubeError::ContainerNotFound(name.to_string())),
        None => containers.first().map(|c| c.name.clone()).ok_or(KubeError::NoContainers),
    }
}

/// Compute the debug shape of `template` for `app_name`'s `container`.
///
/// The result idles the container, drops its readiness probe, relaxes a
/// read-only root filesystem if one is set, and labels the template with
/// [`DEBUG_LABEL`]. Applying it to its own output is a no-op.
pub fn apply_debug_shape(
    template: &PodTemplateSpec,
    app_name: &str,
    container: &str,
) -> Result<PodTemplateSpec, KubeError> {
    let mut shaped = template.clone();
    let spec = shaped.spec.as_mut().ok_or(KubeError::NoContainers)?;
    let target = spec
        .containers
        .iter_mut()
        .find(|c| c.name == container)
        .ok_or_else(|| KubeError::ContainerNotFound(container.to_string()))?;

    let (command, args) = idle_command();
    target.command = Some(command);
    target.args = Some(args);
    target.readiness_probe = None;
    if let Some(ctx) = target.security_context.as_mut() {
        if ctx.read_only_root_filesystem.is_some() {
            ctx.read_only_root_filesystem = Some(false);
        }
    }

    shaped
        .metadata
        .get_or_insert_with(Default::default)
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(DEBUG_LABEL.to_string(), app_name.to_string());
    Ok(shaped)
}

/// Whether `template` carries the debug label for `app_name`.
pub fn is_configured(template: &PodTemplateSpec, app_name: &str) -> bool {
    template
        .metadata
        .as_ref()
        .and_then(|m| m.labels.as_ref())
        .and_then(|l| l.get(DEBUG_LABEL))
        .is_some_and(|v| v == app_name)
}

/// Selector for pods created from a debug-shaped template.
pub fn debug_selector(app_name: &str) -> String {
    format!("{DEBUG_LABEL}={app_name}")
}

/// Selector built from the template's own labels, `k=v` joined with `,`.
pub fn labels_selector(template: &PodTemplateSpec) -> Option<String> {
    let labels = template.metadata.as_ref()?.labels.as_ref()?;
    if labels.is_empty() {
        return None;
    }
    Some(labels.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(","))
}

/// Serialize a template for storage as a rollback snapshot.
pub fn snapshot(template: &PodTemplateSpec) -> Result<String, serde_json::Error> {
    serde_json::to_string(template)
}

/// Inverse of [`snapshot`].
pub fn restore(snapshot: &str) -> Result<PodTemplateSpec, serde_json::Error> {
    serde_json::from_str(snapshot)
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
