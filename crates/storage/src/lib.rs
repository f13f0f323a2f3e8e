// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mirage-storage: persistence of app records

mod file;
mod registry;

#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use file::FileRegistry;
pub use registry::{validate_app, AppRegistry, RegistryError};

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryRegistry;
