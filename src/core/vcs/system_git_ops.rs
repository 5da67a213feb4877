//! Release-facing operations for SystemGit (scoped diffs, commits, pushes, remotes)

use super::system_git::SystemGit;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt, ToolError};
use crate::utils::path_to_git_format;
use std::path::PathBuf;

impl SystemGit {
  /// Check whether `paths` match HEAD in the working tree
  ///
  /// Only the listed paths are compared, so unrelated in-progress work
  /// elsewhere in the tree does not count as dirty.
  pub fn is_working_tree_clean(&self, paths: &[PathBuf]) -> ReleaseResult<bool> {
    self.diff_index_quiet(false, paths)
  }

  /// Check whether the index differs from HEAD for `paths`
  pub fn has_staged_changes(&self, paths: &[PathBuf]) -> ReleaseResult<bool> {
    Ok(!self.diff_index_quiet(true, paths)?)
  }

  /// `git diff-index --quiet HEAD -- <paths>`: exit 0 is clean, exit 1 is dirty
  fn diff_index_quiet(&self, cached: bool, paths: &[PathBuf]) -> ReleaseResult<bool> {
    let mut cmd = self.git_cmd();
    cmd.arg("diff-index");
    if cached {
      cmd.arg("--cached");
    }
    cmd.args(["--quiet", "HEAD", "--"]);
    for path in paths {
      cmd.arg(path_to_git_format(path));
    }

    log::debug!("running: git diff-index{} --quiet HEAD -- {:?}", if cached { " --cached" } else { "" }, paths);
    let output = cmd.output().context("Failed to run git diff-index")?;

    match output.status.code() {
      Some(0) => Ok(true),
      Some(1) => Ok(false),
      _ => Err(ReleaseError::Tool(ToolError::CommandFailed {
        command: "git diff-index".to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      })),
    }
  }

  /// Stage exactly `paths`
  pub fn add(&self, paths: &[PathBuf]) -> ReleaseResult<()> {
    let mut args = vec!["add".to_string(), "--".to_string()];
    args.extend(paths.iter().map(|p| path_to_git_format(p)));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    self.run(&args)?;
    Ok(())
  }

  /// Commit `paths` with `message`
  pub fn commit_paths(&self, message: &str, paths: &[PathBuf]) -> ReleaseResult<String> {
    let mut args = vec!["commit".to_string(), "-m".to_string(), message.to_string(), "--".to_string()];
    args.extend(paths.iter().map(|p| path_to_git_format(p)));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    self.run(&args)?;
    self.head_commit()
  }

  /// Push every local branch to `remote`. Never forces.
  pub fn push_all(&self, remote: &str) -> ReleaseResult<()> {
    self.push(remote, "--all")
  }

  /// Push every local tag to `remote`. Never forces.
  pub fn push_tags(&self, remote: &str) -> ReleaseResult<()> {
    self.push(remote, "--tags")
  }

  fn push(&self, remote: &str, what: &str) -> ReleaseResult<()> {
    println!("   Pushing {} to '{}'...", what.trim_start_matches('-'), remote);
    log::debug!("running: git push -v {} {}", what, remote);

    let output = self
      .git_cmd()
      .args(["push", "-v", what, remote])
      .output()
      .context("Failed to push")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ReleaseError::Tool(ToolError::PushRejected {
        remote: remote.to_string(),
        reason: stderr.trim().to_string(),
      }));
    }

    println!("   ✅ Pushed {} to {}", what.trim_start_matches('-'), remote);
    Ok(())
  }

  /// URL configured for `remote`, or None when the remote does not exist
  pub fn get_remote_url(&self, remote: &str) -> ReleaseResult<Option<String>> {
    let output = self
      .git_cmd()
      .args(["remote", "get-url", remote])
      .output()
      .context("Failed to read remote URL")?;

    if !output.status.success() {
      return Ok(None);
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(if url.is_empty() { None } else { Some(url) })
  }

  /// Browsable https URL of `remote`
  pub fn remote_repo_url(&self, remote: &str) -> ReleaseResult<Option<String>> {
    Ok(self.get_remote_url(remote)?.map(|url| normalize_remote_url(&url)))
  }

  /// Number of commits reachable from HEAD
  #[cfg(test)]
  pub fn commit_count(&self) -> ReleaseResult<usize> {
    let stdout = self.run(&["rev-list", "--count", "HEAD"])?;
    stdout
      .trim()
      .parse::<usize>()
      .map_err(|e| ReleaseError::message(format!("Unexpected rev-list output: {}", e)))
  }
}

/// Turn `git@host:owner/repo.git`, `ssh://git@host/owner/repo.git` or
/// `https://host/owner/repo.git` into `https://host/owner/repo`
///
/// Local paths are returned unchanged.
pub fn normalize_remote_url(url: &str) -> String {
  let trimmed = url.trim().trim_end_matches('/');
  let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

  if let Some(rest) = trimmed.strip_prefix("ssh://") {
    let rest = rest.split_once('@').map(|(_, host)| host).unwrap_or(rest);
    return format!("https://{}", rest);
  }

  if let Some(rest) = trimmed.strip_prefix("http://").or_else(|| trimmed.strip_prefix("https://")) {
    let rest = rest.split_once('@').map(|(_, host)| host).unwrap_or(rest);
    return format!("https://{}", rest);
  }

  // scp-like syntax: user@host:owner/repo
  if let Some((user_host, path)) = trimmed.split_once(':')
    && user_host.contains('@')
    && !path.starts_with('/')
  {
    let host = user_host.split_once('@').map(|(_, h)| h).unwrap_or(user_host);
    return format!("https://{}/{}", host, path);
  }

  trimmed.to_string()
}
