//! State retrieval via the Terraform or Terragrunt CLI.
//!
//! One blocking subprocess per run: `<program> state pull` in the configured
//! directory, with the whole stdout capture buffered before decoding starts.
//! Ambient configuration (which program, which directory) is resolved by the
//! entry point and threaded in as plain values.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

/// Which state-provider program backs the pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCommand {
    Terraform,
    Terragrunt,
}

impl StateCommand {
    pub fn program(self) -> &'static str {
        match self {
            StateCommand::Terraform => "terraform",
            StateCommand::Terragrunt => "terragrunt",
        }
    }

    /// Resolve the provider from an already-read `TF_TERRAGRUNT` value: any
    /// non-empty setting switches to Terragrunt.
    pub fn from_override(value: Option<&str>) -> Self {
        match value {
            Some(setting) if !setting.is_empty() => StateCommand::Terragrunt,
            _ => StateCommand::Terraform,
        }
    }
}

/// Run `<program> state pull` in `dir` and capture its stdout.
///
/// An empty capture is a legal "no state" outcome and is left for the
/// decoder to classify. A spawn failure or non-zero exit is fatal; the
/// provider's stderr is folded into the error so the diagnostic names the
/// actual cause.
pub fn pull_state(command: StateCommand, dir: &Path) -> Result<Vec<u8>> {
    let output = Command::new(command.program())
        .args(["state", "pull"])
        .current_dir(dir)
        .output()
        .with_context(|| {
            format!(
                "Error running `{} state pull` in directory {}",
                command.program(),
                dir.display()
            )
        })?;

    if !output.status.success() {
        bail!(
            "`{} state pull` in directory {} failed ({}): {}",
            command.program(),
            dir.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(output.stdout)
}
