// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: an isolated config dir plus helpers to run the CLI.

use std::path::PathBuf;
use std::process::Output;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use tempfile::TempDir;

/// Kubeconfig for a cluster nobody listens on. Client construction succeeds;
/// any actual API call fails with a connection error.
const OFFLINE_KUBECONFIG: &str = r#"apiVersion: v1
kind: Config
clusters:
- name: offline
  cluster:
    server: https://127.0.0.1:9
contexts:
- name: offline
  context:
    cluster: offline
    user: offline
current-context: offline
users:
- name: offline
  user:
    token: unused
"#;

/// Upper bound for polling on background daemon effects.
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Poll `condition` every 20ms until it holds or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    condition()
}

pub struct Project {
    dir: TempDir,
}

impl Project {
    /// Fresh config dir with an offline kubeconfig.
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kubeconfig"), OFFLINE_KUBECONFIG).unwrap();
        Self { dir }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.dir.path().join("mirage")
    }

    /// `mirage-debug` bound to this project's config dir.
    pub fn mirage(&self) -> Cli {
        let mut cmd = Command::cargo_bin("mirage-debug").unwrap();
        cmd.env("MIRAGE_CONFIG_DIR", self.config_dir())
            .env("MIRAGE_KUBECONFIG", self.dir.path().join("kubeconfig"))
            .env("MIRAGE_DAEMON_BINARY", daemon_binary())
            .env("NO_COLOR", "1")
            .env_remove("COLOR")
            .current_dir(self.dir.path());
        Cli { cmd }
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        // Best effort; the daemon may never have started
        let _ = self.mirage().cmd.args(["daemon", "stop"]).output();
    }
}

fn daemon_binary() -> PathBuf {
    assert_cmd::cargo::cargo_bin("mirage-debugd")
}

pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Run and require exit code 0.
    pub fn passes(mut self) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run { output };
        assert!(run.output.status.success(), "expected success, got {}", run.describe());
        run
    }

    /// Run and require the given non-zero exit code.
    pub fn exits(mut self, code: i32) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run { output };
        assert_eq!(run.output.status.code(), Some(code), "{}", run.describe());
        run
    }
}

pub struct Run {
    output: Output,
}

impl Run {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.output.stdout).unwrap()
    }

    fn describe(&self) -> String {
        format!(
            "status {:?}\n--- stdout ---\n{}\n--- stderr ---\n{}",
            self.output.status.code(),
            self.stdout(),
            self.stderr()
        )
    }
}
