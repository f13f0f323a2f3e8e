// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mirage_core::{App, ProgramType};

use super::{remote_binary, remote_config, LangError, LanguageAdaptor};
use crate::tools::{DebugTool, Delve};

/// Go programs, debugged with Delve.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoAdaptor;

impl LanguageAdaptor for GoAdaptor {
    fn program_type(&self) -> ProgramType {
        ProgramType::Go
    }

    fn debug_tool(&self) -> &dyn DebugTool {
        &Delve
    }

    fn build_command(&self, app: &App) -> Result<String, LangError> {
        let local = self.check(app)?;
        if let Some(custom) = local.custom_build_command.as_deref().filter(|c| !c.trim().is_empty()) {
            return Ok(custom.to_string());
        }
        let entry = match local.app_entry_path.trim() {
            "" => ".",
            entry => entry,
        };
        Ok(format!(
            "CGO_ENABLED=0 GOOS=linux GOARCH={} go build -gcflags='all=-N -l' -o {} {}",
            app.remote_runtime.target_arch,
            local.build_output.display(),
            entry,
        ))
    }

    fn debug_command(&self, app: &App) -> Result<String, LangError> {
        let local = self.check(app)?;
        let remote = remote_config(app)?;
        let mut command = format!(
            "{} --listen=:{} --headless=true --api-version=2 --accept-multiclient \
             --check-go-version=false exec {}",
            remote.debug_tool_path,
            remote.remote_debugging_port,
            remote_binary(local, remote),
        );
        let args = local.app_args.trim();
        if !args.is_empty() {
            command.push_str(" -- ");
            command.push_str(args);
        }
        Ok(command)
    }
}
