// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mirage_core::Arch;

use super::{DebugTool, Recipe, ToolError};

const VERSION: &str = "v13.2";

/// Statically linked gdbserver, downloaded prebuilt. Only amd64 builds exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct GdbServer;

impl DebugTool for GdbServer {
    fn name(&self) -> &'static str {
        "gdbserver"
    }

    fn version(&self) -> &'static str {
        VERSION
    }

    fn artifact(&self) -> &'static str {
        "gdbserver"
    }

    fn recipe(&self, arch: Arch) -> Result<Recipe, ToolError> {
        match arch {
            Arch::Amd64 => Ok(Recipe::Download(format!(
                "https://github.com/miragedebug/gdb-static/raw/main/gdbserver-{VERSION}-{arch}"
            ))),
            Arch::Arm64 => Err(ToolError::UnsupportedArch { tool: self.name(), arch }),
        }
    }
}
