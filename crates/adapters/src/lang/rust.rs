// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mirage_core::{App, ProgramType};

use super::{remote_binary, remote_config, LangError, LanguageAdaptor};
use crate::tools::{DebugTool, GdbServer};

/// Rust programs, debugged with gdbserver.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustAdaptor;

impl LanguageAdaptor for RustAdaptor {
    fn program_type(&self) -> ProgramType {
        ProgramType::Rust
    }

    fn debug_tool(&self) -> &dyn DebugTool {
        &GdbServer
    }

    fn build_command(&self, app: &App) -> Result<String, LangError> {
        let local = self.check(app)?;
        if let Some(custom) = local.custom_build_command.as_deref().filter(|c| !c.trim().is_empty()) {
            return Ok(custom.to_string());
        }
        let triple = format!("{}-unknown-linux-gnu", app.remote_runtime.target_arch.cpu());
        let artifact = format!("target/{triple}/debug/{}", local.binary_name());
        let output = local.build_output.display().to_string();

        // cargo picks the artifact path itself; move it to where the app expects it.
        let mut command = format!("cargo build --target {triple}");
        if output != artifact {
            if let Some(dir) = local.build_output.parent().filter(|d| !d.as_os_str().is_empty()) {
                command.push_str(&format!(" && mkdir -p {}", dir.display()));
            }
            command.push_str(&format!(" && cp {artifact} {output}"));
        }
        Ok(command)
    }

    fn debug_command(&self, app: &App) -> Result<String, LangError> {
        let local = self.check(app)?;
        let remote = remote_config(app)?;
        let command = format!(
            "{} 0.0.0.0:{} {} {}",
            remote.debug_tool_path,
            remote.remote_debugging_port,
            remote_binary(local, remote),
            local.app_args.trim(),
        );
        Ok(command.trim_end().to_string())
    }
}
