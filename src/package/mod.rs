//! Distribution packages: build, validate, upload
//!
//! Everything goes through the configured interpreter (`python3 -m build`,
//! `python3 -m twine`). Uploads only happen on an explicit command, and only
//! after `twine check` has passed on the same artifacts.

use crate::core::config::PackagingConfig;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt, ToolError};
use crate::core::exec::{require_tool, run_captured, run_inherited, tool_cmd};
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Where an upload goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageIndex {
  /// `packaging.test_index_url`
  Test,
  /// twine's default repository
  Production,
}

pub struct PackageBuilder<'a> {
  root: &'a Path,
  config: &'a PackagingConfig,
  identifier: &'a str,
  version: &'a str,
}

impl<'a> PackageBuilder<'a> {
  pub fn new(root: &'a Path, config: &'a PackagingConfig, identifier: &'a str, version: &'a str) -> Self {
    Self {
      root,
      config,
      identifier,
      version,
    }
  }

  fn python(&self) -> Command {
    let mut cmd = tool_cmd(&self.config.python, self.root);
    cmd.arg("-m");
    cmd
  }

  fn dist_dir(&self) -> PathBuf {
    self.root.join(&self.config.dist_dir)
  }

  /// Build sdist and wheel, then validate them with `twine check`
  pub fn build(&self, clean_first: bool) -> ReleaseResult<Vec<PathBuf>> {
    require_tool(&self.config.python)?;

    if clean_first {
      self.clean()?;
    }

    println!("📦 Building {} {}...", self.identifier, self.version);
    let mut cmd = self.python();
    cmd
      .args(["build", "--sdist", "--wheel", "--outdir"])
      .arg(self.dist_dir())
      .arg(".");
    run_inherited(&mut cmd)?;

    let artifacts = self.find_artifacts()?;
    for artifact in &artifacts {
      println!("   📄 {}", artifact.display());
    }

    self.check(&artifacts)?;
    Ok(artifacts)
  }

  /// Remove the build and dist directories
  pub fn clean(&self) -> ReleaseResult<()> {
    for dir in [&self.config.build_dir, &self.config.dist_dir] {
      let path = self.root.join(dir);
      if path.exists() {
        log::debug!("removing {}", path.display());
        fs::remove_dir_all(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
      }
    }
    Ok(())
  }

  /// The sdist and wheel for this version in the dist directory
  ///
  /// Both must exist. Python packaging writes `-` in the project name as
  /// `_`, so both spellings are tried.
  pub fn find_artifacts(&self) -> ReleaseResult<Vec<PathBuf>> {
    let dist = Pattern::escape(&self.dist_dir().to_string_lossy());
    let mut names = vec![self.identifier.to_string()];
    let normalized = self.identifier.replace('-', "_");
    if normalized != self.identifier {
      names.push(normalized);
    }

    let mut artifacts = Vec::new();
    for extension in ["tar.gz", "whl"] {
      let mut found = Vec::new();
      for name in &names {
        let pattern = format!("{}/{}-{}*.{}", dist, Pattern::escape(name), Pattern::escape(self.version), extension);
        log::debug!("looking for {}", pattern);
        found.extend(glob::glob(&pattern)?.filter_map(Result::ok));
      }

      if found.is_empty() {
        return Err(ReleaseError::PackageValidation {
          reason: format!(
            "no {} for {} {} in {}",
            extension,
            self.identifier,
            self.version,
            self.dist_dir().display()
          ),
        });
      }
      found.sort();
      artifacts.extend(found);
    }

    Ok(artifacts)
  }

  /// `twine check`; any complaint is a validation failure
  pub fn check(&self, artifacts: &[PathBuf]) -> ReleaseResult<()> {
    require_tool(&self.config.python)?;
    println!("🔍 Checking distribution files...");

    let mut cmd = self.python();
    cmd.args(["twine", "check"]).args(artifacts);
    match run_captured(&mut cmd) {
      Ok(_) => {
        println!("   ✅ twine check passed");
        Ok(())
      }
      Err(ReleaseError::Tool(ToolError::CommandFailed { stderr, .. })) => {
        Err(ReleaseError::PackageValidation { reason: stderr })
      }
      Err(e) => Err(e),
    }
  }

  /// `twine upload` to `index`
  pub fn upload(&self, artifacts: &[PathBuf], index: PackageIndex) -> ReleaseResult<()> {
    require_tool(&self.config.python)?;

    let mut cmd = self.python();
    cmd.args(["twine", "upload"]);
    match index {
      PackageIndex::Test => {
        println!("📤 Uploading to {}...", self.config.test_index_url);
        cmd.args(["--repository-url", self.config.test_index_url.as_str()]);
      }
      PackageIndex::Production => println!("📤 Uploading to PyPI..."),
    }
    cmd.args(artifacts);

    run_inherited(&mut cmd)?;
    println!("   ✅ Uploaded {} file(s)", artifacts.len());
    Ok(())
  }
}
