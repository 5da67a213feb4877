//! Integration tests for `doi-release update` and `doi-release commit-updates`

use crate::helpers::{INIT_PY, TestProject, run_doi_release, run_ok};
use anyhow::Result;

#[test]
fn test_update_propagates_version() -> Result<()> {
  let project = TestProject::new()?;
  project.set_version("1.2.0")?;

  let output = run_ok(&project.path, &["update"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("CITATION.cff"), "stdout: {}", stdout);

  let init = project.read_file("iga/__init__.py")?;
  assert_eq!(init, INIT_PY.replace("'1.1.0'", "'1.2.0'"));

  let citation = project.read_file("CITATION.cff")?;
  assert!(citation.contains("version: \"1.2.0\"\n"));
  assert!(!citation.contains("date-released: 2024-01-15"));
  assert!(citation.contains("doi: 10.22002/abc12-de345\n"));

  assert!(project.read_file("codemeta.json")?.contains("\"version\": \"1.2.0\""));
  assert!(project.path.join("CITATION.cff.bak").exists());

  Ok(())
}

#[test]
fn test_commit_updates_twice_makes_one_commit() -> Result<()> {
  let project = TestProject::new()?;
  project.set_version("1.2.0")?;

  run_ok(&project.path, &["update"])?;
  run_ok(&project.path, &["commit-updates"])?;
  assert_eq!(project.commit_count()?, 2);
  assert_eq!(project.git_log(1)?, vec!["chore: update stored version number to 1.2.0"]);

  let output = run_ok(&project.path, &["commit-updates"])?;
  assert_eq!(project.commit_count()?, 2);
  assert!(String::from_utf8_lossy(&output.stdout).contains("No changes to commit"));

  Ok(())
}

#[test]
fn test_commit_updates_leaves_unrelated_files_alone() -> Result<()> {
  let project = TestProject::new()?;
  project.set_version("1.2.0")?;
  project.write_file("README.md", "# IGA\n\nWork in progress.\n")?;

  run_ok(&project.path, &["update"])?;
  run_ok(&project.path, &["commit-updates"])?;

  let status = crate::helpers::git(&project.path, &["status", "--porcelain"])?;
  let status = String::from_utf8_lossy(&status.stdout);
  assert!(status.contains("README.md"), "status: {}", status);
  assert!(!status.contains("CITATION.cff "), "status: {}", status);

  Ok(())
}

#[test]
fn test_drifted_init_file_is_schema_drift() -> Result<()> {
  let project = TestProject::new()?;
  project.set_version("1.2.0")?;
  let drifted = INIT_PY.replace("__version__     = '1.1.0'\n", "VERSION = '1.1.0'\n");
  project.write_file("iga/__init__.py", &drifted)?;

  let output = run_doi_release(&project.path, &["update"], "", &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr);
  assert!(stderr.contains("iga/__init__.py"), "stderr: {}", stderr);
  assert!(stderr.contains("version"), "stderr: {}", stderr);
  assert_eq!(project.read_file("iga/__init__.py")?, drifted);

  Ok(())
}

#[test]
fn test_missing_related_link_is_rejected() -> Result<()> {
  let project = TestProject::new()?;
  let codemeta = project.read_file("codemeta.json")?;
  let without_link = codemeta.replace("https://archive.invalid/records/abc12-de345", "");
  project.write_file("codemeta.json", &without_link)?;

  let output = run_doi_release(&project.path, &["update"], "", &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
  assert!(stderr.contains("relatedLink"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config("poll_interval_secs = 0\n")?;

  let output = run_doi_release(&project.path, &["update"], "", &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
  assert!(stderr.contains("poll_interval_secs"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_configured_file_locations() -> Result<()> {
  let project = TestProject::new()?;
  std::fs::create_dir_all(project.path.join("src/iga"))?;
  std::fs::rename(project.path.join("iga/__init__.py"), project.path.join("src/iga/__init__.py"))?;
  project.write_config("[files]\ninit_file = \"src/iga/__init__.py\"\n")?;
  project.set_version("2.0.0")?;

  run_ok(&project.path, &["update"])?;
  assert!(project.read_file("src/iga/__init__.py")?.contains("'2.0.0'"));

  Ok(())
}
