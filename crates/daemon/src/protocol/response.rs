// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mirage_core::{App, AppStatus};
use serde::{Deserialize, Serialize};

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Pong,

    Hello { version: String },

    App { app: Box<App> },

    Apps { apps: Vec<App> },

    Status { status: AppStatus },

    /// Result of `StopSession`
    Stopped {
        name: String,
        /// Whether a tunnel was running
        existed: bool,
    },

    Ok,

    ShuttingDown,

    Error {
        message: String,
        /// Configuration problem; retrying won't help
        #[serde(default)]
        configuration: bool,
    },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error { message: message.into(), configuration: false }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
