//! GitHub releases and workflow runs via the gh CLI

use crate::core::error::{ReleaseError, ReleaseResult, ToolError};
use crate::core::exec::{require_tool, run_captured, tool_cmd};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One run of a GitHub Actions workflow, as reported by `gh run list/view --json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
  pub database_id: u64,
  pub status: String,
  /// Empty until the run completes
  #[serde(default)]
  pub conclusion: String,
  #[serde(default)]
  pub url: String,
}

impl WorkflowRun {
  pub fn is_complete(&self) -> bool {
    self.status == "completed"
  }

  pub fn succeeded(&self) -> bool {
    self.is_complete() && self.conclusion == "success"
  }
}

const RUN_FIELDS: &str = "databaseId,status,conclusion,url";

/// Thin wrapper over `gh`, run from the project root so it resolves the repository
pub struct GhCli {
  root: PathBuf,
}

impl GhCli {
  /// Locate gh on PATH
  pub fn new(root: &Path) -> ReleaseResult<Self> {
    require_tool("gh")?;
    Ok(Self {
      root: root.to_path_buf(),
    })
  }

  /// `gh release create <tag>` targeting `branch`, body from `notes_file`
  pub fn create_release(&self, tag: &str, branch: &str, title: &str, notes_file: &Path) -> ReleaseResult<()> {
    let mut cmd = tool_cmd("gh", &self.root);
    cmd
      .args(["release", "create", tag, "--target", branch, "--title", title, "--notes-file"])
      .arg(notes_file);

    match run_captured(&mut cmd) {
      Ok(output) => {
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !url.is_empty() {
          println!("   {}", url);
        }
        Ok(())
      }
      Err(ReleaseError::Tool(ToolError::CommandFailed { stderr, .. })) => {
        Err(ReleaseError::Tool(ToolError::RemoteRelease {
          tag: tag.to_string(),
          reason: stderr,
        }))
      }
      Err(e) => Err(e),
    }
  }

  /// Most recent run of `workflow`, if it has ever run
  pub fn latest_run(&self, workflow: &str) -> ReleaseResult<Option<WorkflowRun>> {
    let mut cmd = tool_cmd("gh", &self.root);
    cmd.args(["run", "list", "--workflow", workflow, "--limit", "1", "--json", RUN_FIELDS]);
    let output = run_captured(&mut cmd)?;
    parse_run_list(&String::from_utf8_lossy(&output.stdout))
  }

  /// Current state of run `id`
  pub fn view_run(&self, id: u64) -> ReleaseResult<WorkflowRun> {
    let mut cmd = tool_cmd("gh", &self.root);
    let id = id.to_string();
    cmd.args(["run", "view", id.as_str(), "--json", RUN_FIELDS]);
    let output = run_captured(&mut cmd)?;
    Ok(serde_json::from_slice(&output.stdout)?)
  }
}

fn parse_run_list(json: &str) -> ReleaseResult<Option<WorkflowRun>> {
  let runs: Vec<WorkflowRun> = serde_json::from_str(json)?;
  Ok(runs.into_iter().next())
}
