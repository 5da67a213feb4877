//! Integration tests for `doi-release release`

use crate::helpers::{TestProject, git, run_doi_release};
use anyhow::Result;

#[test]
fn test_release_on_wrong_branch_changes_nothing() -> Result<()> {
  let project = TestProject::new()?;
  git(&project.path, &["checkout", "-b", "develop"])?;
  project.set_version("1.2.0")?;
  let before = project.snapshot()?;
  let commits = project.commit_count()?;

  let output = run_doi_release(&project.path, &["release"], "y\n", &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
  assert!(stderr.contains("'develop'"), "stderr: {}", stderr);
  assert!(stderr.contains("'main'"), "stderr: {}", stderr);
  assert_eq!(project.snapshot()?, before);
  assert_eq!(project.commit_count()?, commits);
  assert!(!project.has_backups());

  Ok(())
}

#[test]
fn test_declining_version_confirmation_aborts() -> Result<()> {
  let project = TestProject::new()?;
  let before = project.snapshot()?;

  for answer in ["n\n", "", "maybe\n"] {
    let output = run_doi_release(&project.path, &["release"], answer, &[])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1), "answer {:?}: {}", answer, stderr);
    assert!(stdout.contains("Have you updated the version number"), "stdout: {}", stdout);
    assert!(stderr.contains("\"version\" field in codemeta.json"), "stderr: {}", stderr);
  }

  assert_eq!(project.snapshot()?, before);
  assert_eq!(project.commit_count()?, 1);
  assert!(!project.has_backups());

  Ok(())
}

#[cfg(unix)]
#[test]
fn test_full_release_with_stand_in_gh() -> Result<()> {
  use crate::helpers::{fake_gh, path_with};

  let project = TestProject::new()?;
  let remote = project.with_remote()?;
  project.set_version("1.2.0")?;
  project.write_config(
    r#"
editor = "true"
workflow_start_delay_secs = 0
poll_interval_secs = 1
"#,
  )?;

  let tools = tempfile::TempDir::new()?;
  let gh_log = tools.path().join("gh.log");
  let bin = fake_gh(tools.path(), &gh_log)?;

  let output = run_doi_release(&project.path, &["release"], "y\n", &[("PATH", path_with(&bin))])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(output.status.success(), "stdout: {}\nstderr: {}", stdout, stderr);

  // Derived files carry the new version
  assert!(project.read_file("iga/__init__.py")?.contains("__version__     = '1.2.0'"));
  assert!(project.read_file("CITATION.cff")?.contains("version: \"1.2.0\""));
  assert!(project.read_file("sample-workflow.yml")?.contains("version: \"1.2.0\""));

  // One bump commit, pushed
  assert_eq!(project.git_log(1)?, vec!["chore: update stored version number to 1.2.0"]);
  let pushed = git(remote.path(), &["log", "-1", "--format=%s", "main"])?;
  assert_eq!(
    String::from_utf8_lossy(&pushed.stdout).trim(),
    "chore: update stored version number to 1.2.0"
  );

  // gh saw the release, then the workflow lookups
  let calls = std::fs::read_to_string(&gh_log)?;
  let calls: Vec<&str> = calls.lines().collect();
  assert!(calls[0].starts_with("release create v1.2.0 --target main --title Release 1.2.0 --notes-file "));
  assert!(calls[1].starts_with("run list --workflow iga.yml --limit 1"));
  assert!(calls[2].starts_with("run view 42"));

  assert!(stdout.contains("doi-release post-release"), "stdout: {}", stdout);

  Ok(())
}

#[cfg(unix)]
#[test]
fn test_failed_github_release_is_reported_after_push() -> Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let project = TestProject::new()?;
  let remote = project.with_remote()?;
  project.set_version("1.2.0")?;
  project.write_config("editor = \"true\"\n")?;

  let tools = tempfile::TempDir::new()?;
  let gh = tools.path().join("gh");
  std::fs::write(&gh, "#!/bin/sh\necho 'HTTP 422: tag_name already exists' >&2\nexit 1\n")?;
  std::fs::set_permissions(&gh, std::fs::Permissions::from_mode(0o755))?;

  let output = run_doi_release(
    &project.path,
    &["release"],
    "yes\n",
    &[("PATH", crate::helpers::path_with(tools.path()))],
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr);
  assert!(stderr.contains("tag_name already exists"), "stderr: {}", stderr);

  // No rollback: the bump commit is already on the remote
  let pushed = git(remote.path(), &["log", "-1", "--format=%s", "main"])?;
  assert_eq!(
    String::from_utf8_lossy(&pushed.stdout).trim(),
    "chore: update stored version number to 1.2.0"
  );

  Ok(())
}
