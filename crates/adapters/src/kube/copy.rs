// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming local files into a container.
//!
//! A blocking task writes a tar archive into one end of an in-memory pipe
//! while the other end feeds the stdin of `tar -x` running in the container,
//! so the archive is never buffered whole.

use std::io::Write;
use std::path::Path;

use tokio_util::io::SyncIoBridge;

use super::{Cluster, ContainerRef, ExecOptions, KubeError};

const PIPE_CAPACITY: usize = 64 * 1024;

/// Archive `local` into `writer` and return the writer.
///
/// Directories are archived under their base name with relative paths kept;
/// files become a single entry. `rename` replaces the root entry name.
pub fn write_archive<W: Write>(
    local: &Path,
    rename: Option<&str>,
    writer: W,
) -> Result<W, KubeError> {
    let archive_err = |source| KubeError::Archive { path: local.to_path_buf(), source };
    let base = local
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| archive_err(std::io::Error::other("path has no file name")))?;
    let root = rename.unwrap_or(&base);

    let mut builder = tar::Builder::new(writer);
    let metadata = std::fs::metadata(local).map_err(archive_err)?;
    if metadata.is_dir() {
        builder.append_dir_all(root, local).map_err(archive_err)?;
    } else {
        builder.append_path_with_name(local, root).map_err(archive_err)?;
    }
    builder.into_inner().map_err(archive_err)
}

/// Copy `local` into `remote_dir` inside the container, optionally renamed.
///
/// Extraction uses `tar -o` so files are owned by the container user rather
/// than the local build user.
pub async fn copy_to_pod<C: Cluster>(
    cluster: &C,
    target: &ContainerRef,
    local: &Path,
    rename: Option<&str>,
    remote_dir: &str,
) -> Result<(), KubeError> {
    let (reader, writer) = tokio::io::duplex(PIPE_CAPACITY);
    let bridge = SyncIoBridge::new(writer);
    let path = local.to_path_buf();
    let renamed = rename.map(str::to_owned);
    let archive = tokio::task::spawn_blocking(move || {
        let mut bridge = write_archive(&path, renamed.as_deref(), bridge)?;
        bridge.flush()?;
        bridge.shutdown()?;
        Ok::<_, KubeError>(())
    });

    let argv = ["tar", "-x", "-o", "-f", "-", "-C", remote_dir].map(str::to_string).to_vec();
    let extracted = cluster.exec(target, argv, ExecOptions::with_stdin(reader)).await;
    let archived = archive.await.map_err(|e| KubeError::Stream(std::io::Error::other(e)))?;

    match (archived, extracted) {
        (Err(e), _) if !is_broken_pipe(&e) => Err(e),
        (_, Err(e)) => Err(e),
        (Err(e), Ok(_)) => Err(e),
        (Ok(()), Ok(_)) => {
            tracing::debug!(
                pod = %target.pod,
                container = %target.container,
                local = %local.display(),
                %remote_dir,
                "copied into container",
            );
            Ok(())
        }
    }
}

/// The remote side hung up; its own error is the real cause.
fn is_broken_pipe(err: &KubeError) -> bool {
    match err {
        KubeError::Archive { source, .. } | KubeError::Stream(source) => {
            source.kind() == std::io::ErrorKind::BrokenPipe
        }
        _ => false,
    }
}

#[cfg(test)]
#[path = "copy_tests.rs"]
mod tests;
