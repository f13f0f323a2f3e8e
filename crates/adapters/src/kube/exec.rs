// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exec over the pod `exec` subresource.

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::{Api, AttachParams};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use super::{ContainerRef, ExecOptions, ExecOutput, KubeError};

/// Exit code carried by a terminal exec status frame.
///
/// `Some(0)` for success, the reported code for `NonZeroExitCode` failures,
/// and `None` when the failure is not a process exit (e.g. the container
/// could not start the command).
pub fn exit_code(status: &Status) -> Option<i32> {
    if status.status.as_deref() == Some("Success") {
        return Some(0);
    }
    status
        .details
        .as_ref()?
        .causes
        .as_ref()?
        .iter()
        .find(|c| c.reason.as_deref() == Some("ExitCode"))
        .and_then(|c| c.message.as_deref())
        .and_then(|m| m.trim().parse().ok())
}

pub(super) async fn run(
    pods: &Api<Pod>,
    target: &ContainerRef,
    command: Vec<String>,
    options: ExecOptions,
) -> Result<ExecOutput, KubeError> {
    let ExecOptions { stdin, live } = options;
    let params = AttachParams::default()
        .container(target.container.clone())
        .stdin(stdin.is_some())
        .stdout(true)
        .stderr(true);

    let mut attached = pods.exec(&target.pod, command.clone(), &params).await?;
    let status = attached.take_status();
    let feed = feed_stdin(stdin, attached.stdin());
    let out = drain(attached.stdout(), live.as_ref());
    let err = drain(attached.stderr(), live.as_ref());
    let (fed, stdout, stderr) = tokio::join!(feed, out, err);

    let status = match status {
        Some(status) => status.await,
        None => None,
    };
    attached.join().await.map_err(|e| KubeError::Exec(e.to_string()))?;

    let (stdout, stderr) = (stdout?, stderr?);
    let status = status.ok_or_else(|| {
        KubeError::Exec(format!("`{}` ended without an exit status", command.join(" ")))
    })?;
    match exit_code(&status) {
        Some(0) => {}
        Some(code) => {
            return Err(KubeError::ExitStatus {
                command: command.join(" "),
                code,
                stderr: stderr.trim().to_string(),
            })
        }
        None => {
            return Err(KubeError::Exec(
                status.message.unwrap_or_else(|| "remote command failed".to_string()),
            ))
        }
    }
    fed?;
    Ok(ExecOutput { stdout, stderr })
}

async fn feed_stdin<W: AsyncWrite + Unpin>(
    source: Option<Box<dyn AsyncRead + Send + Unpin>>,
    sink: Option<W>,
) -> std::io::Result<()> {
    let (Some(mut source), Some(mut sink)) = (source, sink) else {
        return Ok(());
    };
    tokio::io::copy(&mut source, &mut sink).await?;
    sink.shutdown().await
}

async fn drain<R: AsyncRead + Unpin>(
    reader: Option<R>,
    live: Option<&mpsc::UnboundedSender<String>>,
) -> std::io::Result<String> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let mut reader = BufReader::new(reader);
    let mut collected = String::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        if let Some(live) = live {
            let _ = live.send(text.trim_end().to_string());
        }
        collected.push_str(&text);
    }
    Ok(collected)
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
