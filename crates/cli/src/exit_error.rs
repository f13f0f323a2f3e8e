// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

use crate::client::ClientError;

/// Generic failure (cluster, transport, build).
pub const FAILURE: i32 = 1;
/// The request can never succeed as configured; retrying will not help.
pub const CONFIGURATION: i32 = 2;
/// The daemon is not running and could not be reached.
pub const NOT_RUNNING: i32 = 3;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<ClientError> for ExitError {
    fn from(e: ClientError) -> Self {
        let code = if e.is_not_running() {
            NOT_RUNNING
        } else if e.is_configuration() {
            CONFIGURATION
        } else {
            FAILURE
        };
        Self::new(code, e.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

/// Exit code for an error returned by a command.
pub fn code_for(e: &anyhow::Error) -> i32 {
    e.downcast_ref::<ExitError>().map(|x| x.code).unwrap_or(FAILURE)
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
