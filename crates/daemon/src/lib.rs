// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mirage debug daemon library
//!
//! Exposes the IPC protocol types for CLI clients, plus the lifecycle and
//! listener used by the `mirage-debugd` binary.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
pub mod listener;
pub mod protocol;

pub use protocol::{ProtocolError, Request, Response};
