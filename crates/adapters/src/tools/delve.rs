// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mirage_core::Arch;

use super::{DebugTool, Recipe, ToolError, TOOL_DEST_ENV};

const VERSION: &str = "v1.20.1";
const REPO: &str = "https://github.com/go-delve/delve.git";

/// Delve, built from a shallow source checkout for the target architecture.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delve;

impl DebugTool for Delve {
    fn name(&self) -> &'static str {
        "dlv"
    }

    fn version(&self) -> &'static str {
        VERSION
    }

    fn artifact(&self) -> &'static str {
        "dlv"
    }

    fn recipe(&self, arch: Arch) -> Result<Recipe, ToolError> {
        Ok(Recipe::Build(vec![
            format!("git clone --depth 1 --branch {VERSION} {REPO} delve"),
            "cd delve".to_string(),
            format!(
                "CGO_ENABLED=0 GOOS=linux GOARCH={arch} go build -o \"${TOOL_DEST_ENV}\" ./cmd/dlv"
            ),
        ]))
    }
}
