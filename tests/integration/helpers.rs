//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const CODEMETA: &str = r#"{
  "@context": "https://w3id.org/codemeta/3.0",
  "@type": "SoftwareSourceCode",
  "name": "IGA",
  "identifier": "iga",
  "version": "1.1.0",
  "description": "InvenioRDM GitHub Archiver",
  "codeRepository": "https://github.com/example/iga",
  "url": "https://github.com/example/iga",
  "license": "https://github.com/example/iga/blob/main/LICENSE",
  "author": [
    {
      "@type": "Person",
      "givenName": "Ada",
      "familyName": "Lovelace",
      "email": "ada@example.com"
    }
  ],
  "datePublished": "2024-01-15",
  "relatedLink": [
    "https://archive.invalid/records/abc12-de345"
  ]
}
"#;

pub const INIT_PY: &str = r#"'''IGA: InvenioRDM GitHub Archiver.'''

# Package metadata. Rewritten by doi-release; edit codemeta.json instead.
__version__     = '1.1.0'
__description__ = 'InvenioRDM GitHub Archiver'
__url__         = 'https://github.com/example/iga'
__author__      = 'Ada Lovelace'
__email__       = 'ada@example.com'
__license__     = 'https://github.com/example/iga/blob/main/LICENSE'
"#;

pub const CITATION: &str = r#"cff-version: 1.2.0
message: "If you use this software, please cite it as below."
title: IGA
abstract: "InvenioRDM GitHub Archiver"
authors:
  - family-names: Lovelace
    given-names: Ada
url: "https://github.com/example/iga"
repository-code: "https://github.com/example/iga"
license-url: "https://github.com/example/iga/blob/main/LICENSE"
version: "1.1.0"
date-released: 2024-01-15
doi: 10.22002/abc12-de345
"#;

pub const SAMPLE_WORKFLOW: &str = r#"name: InvenioRDM GitHub Archiver
on:
  release:
    types: [published]
jobs:
  run_iga:
    runs-on: ubuntu-latest
    steps:
      - uses: caltechlibrary/iga@v1
        with:
          version: "1.1.0"
"#;

pub const README: &str = r#"# IGA

[![DOI](https://archive.invalid/badge/DOI/10.22002/abc12-de345.svg)](https://archive.invalid/records/abc12-de345)

Archive GitHub releases in InvenioRDM.
"#;

/// Files every fixture project carries, relative to its root
pub const PROJECT_FILES: &[&str] = &[
  "codemeta.json",
  "iga/__init__.py",
  "CITATION.cff",
  "sample-workflow.yml",
  "README.md",
];

/// A released Python project (version 1.1.0) in a git repository on `main`
pub struct TestProject {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestProject {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::create_dir_all(path.join("iga"))?;
    std::fs::write(path.join("codemeta.json"), CODEMETA)?;
    std::fs::write(path.join("iga/__init__.py"), INIT_PY)?;
    std::fs::write(path.join("CITATION.cff"), CITATION)?;
    std::fs::write(path.join("sample-workflow.yml"), SAMPLE_WORKFLOW)?;
    std::fs::write(path.join("README.md"), README)?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial project setup"])?;

    Ok(Self { _root: root, path })
  }

  /// Attach a local bare repository as `origin`
  pub fn with_remote(&self) -> Result<TempDir> {
    let remote = TempDir::new()?;
    git(remote.path(), &["init", "--bare", "--initial-branch=main"])?;
    let url = remote.path().to_string_lossy().to_string();
    git(&self.path, &["remote", "add", "origin", &url])?;
    Ok(remote)
  }

  /// Edit the version in codemeta.json, as the maintainer does before releasing
  pub fn set_version(&self, version: &str) -> Result<()> {
    let content = self.read_file("codemeta.json")?;
    let updated = content.replace("\"version\": \"1.1.0\"", &format!("\"version\": \"{}\"", version));
    anyhow::ensure!(updated != content, "codemeta.json has no version to replace");
    self.write_file("codemeta.json", &updated)
  }

  /// Point `relatedLink` at `base_url` and commit the change
  pub fn use_archive(&self, base_url: &str) -> Result<()> {
    let content = self.read_file("codemeta.json")?;
    let updated = content.replace("https://archive.invalid/records/", &format!("{}/records/", base_url));
    anyhow::ensure!(updated != content, "codemeta.json has no relatedLink to replace");
    self.write_file("codemeta.json", &updated)?;
    git(&self.path, &["commit", "-am", "Use local archive"])?;
    Ok(())
  }

  /// Write release.toml
  pub fn write_config(&self, toml: &str) -> Result<()> {
    self.write_file("release.toml", toml)
  }

  /// Number of commits on HEAD
  pub fn commit_count(&self) -> Result<usize> {
    let output = git(&self.path, &["rev-list", "--count", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().parse()?)
  }

  /// Get git log
  pub fn git_log(&self, n: usize) -> Result<Vec<String>> {
    let output = git(&self.path, &["log", &format!("-{}", n), "--format=%s"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Snapshot of every project file, for before/after comparisons
  pub fn snapshot(&self) -> Result<Vec<String>> {
    PROJECT_FILES.iter().map(|f| self.read_file(f)).collect()
  }

  /// Any `.bak` backup left next to a project file
  pub fn has_backups(&self) -> bool {
    PROJECT_FILES
      .iter()
      .any(|f| self.path.join(format!("{}.bak", f)).exists())
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    std::fs::read_to_string(self.path.join(path)).with_context(|| format!("Failed to read {}", path))
  }

  /// Write a file
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    std::fs::write(self.path.join(path), content).with_context(|| format!("Failed to write {}", path))
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run doi-release, feeding `stdin`; the exit status is left to the caller
pub fn run_doi_release(cwd: &Path, args: &[&str], stdin: &str, env: &[(&str, String)]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_doi-release");

  let mut child = Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .context("Failed to run doi-release")?;

  if let Some(mut input) = child.stdin.take() {
    // The process may exit before reading (e.g. on a failed branch check)
    match input.write_all(stdin.as_bytes()) {
      Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
      _ => {}
    }
  }

  Ok(child.wait_with_output()?)
}

/// Run doi-release and fail unless it succeeds
pub fn run_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_doi_release(cwd, args, "", &[])?;

  if !output.status.success() {
    anyhow::bail!(
      "doi-release command failed: doi-release {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }

  Ok(output)
}

/// Directory holding a stand-in `gh` that logs its arguments to `log`
///
/// `release create` succeeds, and the archiving workflow shows one run that
/// is in progress when listed and complete when viewed.
#[cfg(unix)]
pub fn fake_gh(dir: &Path, log: &Path) -> Result<PathBuf> {
  use std::os::unix::fs::PermissionsExt;

  let bin = dir.join("bin");
  std::fs::create_dir_all(&bin)?;
  let script = format!(
    r#"#!/bin/sh
echo "$@" >> '{log}'
case "$1 $2" in
  "release create") echo "https://github.com/example/iga/releases/tag/$3" ;;
  "run list") echo '[{{"databaseId":42,"status":"in_progress","conclusion":"","url":"https://github.com/example/iga/actions/runs/42"}}]' ;;
  "run view") echo '{{"databaseId":42,"status":"completed","conclusion":"success","url":"https://github.com/example/iga/actions/runs/42"}}' ;;
  *) echo "unexpected gh call: $*" >&2; exit 1 ;;
esac
"#,
    log = log.display()
  );

  let gh = bin.join("gh");
  std::fs::write(&gh, script)?;
  std::fs::set_permissions(&gh, std::fs::Permissions::from_mode(0o755))?;
  Ok(bin)
}

/// PATH with `dir` in front
pub fn path_with(dir: &Path) -> String {
  match std::env::var("PATH") {
    Ok(path) => format!("{}:{}", dir.display(), path),
    Err(_) => dir.display().to_string(),
  }
}

/// Local stand-in for the archive's records API
///
/// Answers every request with `body` as JSON and records the request paths.
pub struct ArchiveStub {
  pub base_url: String,
  requests: Arc<Mutex<Vec<String>>>,
}

impl ArchiveStub {
  pub fn start(body: String) -> Result<Self> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let requests = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&requests);
    std::thread::spawn(move || {
      for stream in listener.incoming() {
        let Ok(mut stream) = stream else { continue };
        let Ok(reader) = stream.try_clone() else { continue };
        let mut reader = BufReader::new(reader);

        let mut request_line = String::new();
        if reader.read_line(&mut request_line).is_err() {
          continue;
        }
        loop {
          let mut header = String::new();
          match reader.read_line(&mut header) {
            Ok(0) | Err(_) => break,
            Ok(_) if header == "\r\n" => break,
            Ok(_) => {}
          }
        }

        if let Some(path) = request_line.split_whitespace().nth(1) {
          seen.lock().unwrap().push(path.to_string());
        }

        let response = format!(
          "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
          body.len(),
          body
        );
        let _ = stream.write_all(response.as_bytes());
      }
    });

    Ok(Self { base_url, requests })
  }

  /// Paths requested so far
  pub fn requests(&self) -> Vec<String> {
    self.requests.lock().unwrap().clone()
  }
}

/// Records API answer whose newest version is `record_id`
pub fn versions_body(record_id: &str) -> String {
  format!(
    r#"{{"hits":{{"total":2,"hits":[{{"id":"{id}","pids":{{"doi":{{"identifier":"10.22002/{id}","provider":"datacite"}}}}}},{{"id":"abc12-de345","pids":{{"doi":{{"identifier":"10.22002/abc12-de345","provider":"datacite"}}}}}}]}}}}"#,
    id = record_id
  )
}

/// Environment that keeps requests to the local archive off any proxy
pub fn no_proxy() -> Vec<(&'static str, String)> {
  vec![
    ("NO_PROXY", "127.0.0.1,localhost".to_string()),
    ("no_proxy", "127.0.0.1,localhost".to_string()),
  ]
}
