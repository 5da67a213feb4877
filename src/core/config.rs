use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for doi-release
/// Searched in order: release.toml, .release.toml, .config/release.toml
///
/// Every field has a default, so a project without a config file behaves
/// like the stock release scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
  /// Branch releases are cut from
  pub release_branch: String,

  /// Remote pushed to and reported
  pub remote: String,

  /// Workflow file name of the archiving automation (`gh run list --workflow`)
  pub workflow: String,

  /// Seconds to wait after creating the release before looking up the run
  pub workflow_start_delay_secs: u64,

  /// Seconds between workflow status polls
  pub poll_interval_secs: u64,

  /// Editor command for release notes (overrides $VISUAL / $EDITOR)
  pub editor: Option<String>,

  /// Render every derived file before writing any of them
  pub transactional: bool,

  /// Timeout for archive API requests
  pub archive_timeout_secs: u64,

  pub files: FilesConfig,

  pub packaging: PackagingConfig,
}

impl Default for ReleaseConfig {
  fn default() -> Self {
    Self {
      release_branch: "main".to_string(),
      remote: "origin".to_string(),
      workflow: "iga.yml".to_string(),
      workflow_start_delay_secs: 5,
      poll_interval_secs: 10,
      editor: None,
      transactional: false,
      archive_timeout_secs: 30,
      files: FilesConfig::default(),
      packaging: PackagingConfig::default(),
    }
  }
}

/// Locations of the canonical record and its derived files, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
  pub codemeta: PathBuf,
  pub citation: PathBuf,
  pub sample_workflow: PathBuf,
  pub readme: PathBuf,
  /// Package init file; defaults to `<identifier>/__init__.py`
  pub init_file: Option<PathBuf>,
}

impl Default for FilesConfig {
  fn default() -> Self {
    Self {
      codemeta: PathBuf::from("codemeta.json"),
      citation: PathBuf::from("CITATION.cff"),
      sample_workflow: PathBuf::from("sample-workflow.yml"),
      readme: PathBuf::from("README.md"),
      init_file: None,
    }
  }
}

impl FilesConfig {
  /// Resolve the package init file for a program identifier
  pub fn init_file_for(&self, identifier: &str) -> PathBuf {
    self
      .init_file
      .clone()
      .unwrap_or_else(|| Path::new(identifier).join("__init__.py"))
  }
}

/// Python packaging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingConfig {
  /// Interpreter used for `-m build` and `-m twine`
  pub python: String,
  pub build_dir: PathBuf,
  pub dist_dir: PathBuf,
  pub test_index_url: String,
}

impl Default for PackagingConfig {
  fn default() -> Self {
    Self {
      python: "python3".to_string(),
      build_dir: PathBuf::from("build"),
      dist_dir: PathBuf::from("dist"),
      test_index_url: "https://test.pypi.org/legacy/".to_string(),
    }
  }
}

impl ReleaseConfig {
  /// Find config file in search order: release.toml, .release.toml, .config/release.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("release.toml"),
      path.join(".release.toml"),
      path.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config, falling back to defaults when no file exists
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      log::debug!("no release.toml under {}, using defaults", path.display());
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;

    log::debug!("loaded config from {}", config_path.display());
    Ok(config)
  }

  /// Parse and validate config text
  pub fn parse(content: &str) -> ReleaseResult<Self> {
    let config: ReleaseConfig = toml_edit::de::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> ReleaseResult<()> {
    let invalid = |field: &str, reason: &str| {
      Err(ReleaseError::Config(ConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
      }))
    };

    if self.release_branch.trim().is_empty() {
      return invalid("release_branch", "must not be empty");
    }
    if self.remote.trim().is_empty() {
      return invalid("remote", "must not be empty");
    }
    if self.workflow.trim().is_empty() {
      return invalid("workflow", "must not be empty");
    }
    if self.poll_interval_secs == 0 {
      return invalid("poll_interval_secs", "must be at least 1");
    }
    if self.packaging.python.trim().is_empty() {
      return invalid("packaging.python", "must not be empty");
    }

    Ok(())
  }
}
