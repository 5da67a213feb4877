//! Integration tests for `doi-release update-doi` and `doi-release post-release`

use crate::helpers::{ArchiveStub, TestProject, git, no_proxy, run_doi_release, versions_body};
use anyhow::Result;

#[test]
fn test_update_doi_with_unreachable_archive_changes_nothing() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config("archive_timeout_secs = 5\n")?;
  let before = project.snapshot()?;

  let output = run_doi_release(&project.path, &["update-doi"], "", &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr);
  assert!(stderr.contains("archive.invalid/api/records/abc12-de345/versions"), "stderr: {}", stderr);
  assert_eq!(project.snapshot()?, before);
  assert!(!project.has_backups());

  Ok(())
}

#[test]
fn test_post_release_refuses_dirty_doi_files() -> Result<()> {
  let project = TestProject::new()?;
  project.write_file("README.md", "# IGA\n\nUnreleased notes.\n")?;

  let output = run_doi_release(&project.path, &["post-release"], "", &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
  assert!(stderr.contains("README.md"), "stderr: {}", stderr);
  assert_eq!(project.commit_count()?, 1);

  Ok(())
}

#[test]
fn test_post_release_commits_and_pushes_new_doi() -> Result<()> {
  let project = TestProject::new()?;
  let remote = project.with_remote()?;
  let archive = ArchiveStub::start(versions_body("new99-rec00"))?;
  project.use_archive(&archive.base_url)?;
  assert_eq!(project.commit_count()?, 2);

  let output = run_doi_release(&project.path, &["post-release"], "", &no_proxy())?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(output.status.success(), "stdout: {}\nstderr: {}", stdout, stderr);
  assert_eq!(archive.requests(), vec!["/api/records/abc12-de345/versions"]);

  let citation = project.read_file("CITATION.cff")?;
  assert!(citation.contains("doi: 10.22002/new99-rec00\n"), "citation: {}", citation);
  let readme = project.read_file("README.md")?;
  assert!(readme.contains("records/new99-rec00"), "readme: {}", readme);
  assert!(readme.contains("DOI/10.22002/new99-rec00.svg"), "readme: {}", readme);
  assert!(!readme.contains("abc12-de345"), "readme: {}", readme);
  let codemeta = project.read_file("codemeta.json")?;
  assert!(codemeta.contains(&format!("\"{}/records/new99-rec00\"", archive.base_url)));

  assert_eq!(project.commit_count()?, 3);
  assert_eq!(project.git_log(1)?, vec!["chore: update DOI to 10.22002/new99-rec00"]);

  let pushed = git(remote.path(), &["log", "-1", "--format=%s", "main"])?;
  assert_eq!(
    String::from_utf8_lossy(&pushed.stdout).trim(),
    "chore: update DOI to 10.22002/new99-rec00"
  );

  // The archive still reports the same record: nothing to commit or push
  let output = run_doi_release(&project.path, &["post-release"], "", &no_proxy())?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(output.status.success(), "stdout: {}", stdout);
  assert!(stdout.contains("DOI already up to date"), "stdout: {}", stdout);
  assert!(stdout.contains("No changes to commit"), "stdout: {}", stdout);
  assert!(!stdout.contains("Pushing"), "stdout: {}", stdout);
  assert_eq!(project.commit_count()?, 3);
  assert_eq!(archive.requests().len(), 2);
  assert_eq!(archive.requests()[1], "/api/records/new99-rec00/versions");

  Ok(())
}

#[test]
fn test_update_doi_leaves_changes_uncommitted() -> Result<()> {
  let project = TestProject::new()?;
  let archive = ArchiveStub::start(versions_body("new99-rec00"))?;
  project.use_archive(&archive.base_url)?;

  let output = run_doi_release(&project.path, &["update-doi"], "", &no_proxy())?;
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

  assert!(project.read_file("CITATION.cff")?.contains("doi: 10.22002/new99-rec00\n"));
  assert!(project.path.join("CITATION.cff.bak").exists());
  assert_eq!(project.commit_count()?, 2);

  Ok(())
}
