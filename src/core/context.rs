//! Immutable release context - build once, pass everywhere
//!
//! # Design
//!
//! Everything a stage needs to know about the project (config, the canonical
//! record, the current branch, the remote) is computed once in main.rs and
//! handed to every command by reference. Stages never re-derive these values
//! halfway through a run, so each stage's inputs are explicit.
//!
//! ```text
//! main.rs:
//!   ReleaseContext::build() -> &ReleaseContext
//!   |
//!   v
//! commands/release.rs, packages.rs, etc:
//!   fn run_*(ctx: &ReleaseContext)
//! ```

use crate::core::config::ReleaseConfig;
use crate::core::error::ReleaseResult;
use crate::core::vcs::SystemGit;
use crate::metadata::{MetadataStore, ProjectMetadata};
use std::path::{Path, PathBuf};

/// Run-wide state shared by every stage
pub struct ReleaseContext {
  /// Project root (directory holding codemeta.json)
  pub root: PathBuf,

  /// release.toml, or defaults
  pub config: ReleaseConfig,

  /// Canonical record as loaded at run start
  pub metadata: ProjectMetadata,

  /// Branch checked out at run start
  pub branch: String,

  /// Browsable URL of the configured remote, if it exists
  pub remote_url: Option<String>,

  /// Release date written into derived files (YYYY-MM-DD, local time)
  pub today: String,

  /// Git backend rooted at `root`
  pub git: SystemGit,
}

impl ReleaseContext {
  /// Build the context for the project at `root`
  pub fn build(root: &Path) -> ReleaseResult<Self> {
    let root = root.to_path_buf();
    let git = SystemGit::open(&root)?;
    let config = ReleaseConfig::load(&root)?;
    let metadata = MetadataStore::new(&root, &config).load()?;
    let branch = git.current_branch()?;
    let remote_url = git.remote_repo_url(&config.remote)?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    log::debug!(
      "context: {} {} on branch {} (remote {:?})",
      metadata.identifier,
      metadata.version,
      branch,
      remote_url
    );

    Ok(Self {
      root,
      config,
      metadata,
      branch,
      remote_url,
      today,
      git,
    })
  }

  /// Metadata store over this project
  pub fn store(&self) -> MetadataStore<'_> {
    MetadataStore::new(&self.root, &self.config)
  }
}
