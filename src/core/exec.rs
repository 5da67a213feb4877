//! Subprocess helpers for the non-git tools (gh, python, editor)
//!
//! Git goes through `SystemGit`, which isolates its environment. The tools
//! here need the operator's environment (gh auth, virtualenvs, $EDITOR), so
//! they inherit it.

use crate::core::error::{PreconditionError, ReleaseError, ReleaseResult, ToolError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Resolve an executable on PATH
pub fn require_tool(tool: &str) -> ReleaseResult<PathBuf> {
  which::which(tool).map_err(|_| {
    ReleaseError::Precondition(PreconditionError::ToolMissing {
      tool: tool.to_string(),
    })
  })
}

/// Render a command for logs and error messages
pub fn describe(cmd: &Command) -> String {
  let mut parts = vec![cmd.get_program().to_string_lossy().to_string()];
  parts.extend(cmd.get_args().map(|a| a.to_string_lossy().to_string()));
  parts.join(" ")
}

/// Build a command for `program` running in `cwd`
pub fn tool_cmd(program: &str, cwd: &Path) -> Command {
  let mut cmd = Command::new(program);
  cmd.current_dir(cwd);
  cmd
}

/// Run a command to completion, capturing output
///
/// Non-zero exit becomes `ToolError::CommandFailed` carrying stderr verbatim.
pub fn run_captured(cmd: &mut Command) -> ReleaseResult<Output> {
  let description = describe(cmd);
  log::debug!("running: {}", description);

  let output = cmd.output().map_err(|e| {
    ReleaseError::Tool(ToolError::CommandFailed {
      command: description.clone(),
      stderr: e.to_string(),
    })
  })?;

  if !output.status.success() {
    let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
      // twine reports check failures on stdout
      stderr = String::from_utf8_lossy(&output.stdout).trim().to_string();
    }
    return Err(ReleaseError::Tool(ToolError::CommandFailed {
      command: description,
      stderr,
    }));
  }

  Ok(output)
}

/// Run a command attached to the terminal (for builds, uploads, `gh run watch`-style output)
pub fn run_inherited(cmd: &mut Command) -> ReleaseResult<()> {
  let description = describe(cmd);
  log::debug!("running (attached): {}", description);

  let status = cmd.status().map_err(|e| {
    ReleaseError::Tool(ToolError::CommandFailed {
      command: description.clone(),
      stderr: e.to_string(),
    })
  })?;

  if !status.success() {
    return Err(ReleaseError::Tool(ToolError::CommandFailed {
      command: description,
      stderr: format!("exited with {}", status),
    }));
  }

  Ok(())
}
