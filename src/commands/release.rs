//! Release commands: the full pipeline and its two standalone steps
//!
//! `update` and `commit-updates` run the propagate and commit stages on their
//! own, for when a version bump needs to land without cutting a release.

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::release::sequencer;

/// `doi-release release`
pub fn run_release(ctx: &ReleaseContext) -> ReleaseResult<()> {
  println!("🏷️  Releasing {} {} from {}", ctx.metadata.name, ctx.metadata.version, ctx.root.display());
  println!();
  let record = sequencer::run_release(ctx)?;
  log::info!("released {} from {} (workflow run {:?})", record.tag, record.branch, record.run_id);
  Ok(())
}

/// `doi-release update`
pub fn run_update(ctx: &ReleaseContext) -> ReleaseResult<()> {
  let modified = sequencer::propagate_metadata(ctx)?;
  if !modified.is_empty() {
    println!();
    println!("💡 Review the changes, then run `doi-release commit-updates`");
  }
  Ok(())
}

/// `doi-release commit-updates`
pub fn run_commit_updates(ctx: &ReleaseContext) -> ReleaseResult<()> {
  println!("📋 Committing version files...");
  let message = format!("chore: update stored version number to {}", ctx.metadata.version);
  sequencer::commit_if_changed(ctx, &ctx.store().version_files(&ctx.metadata), &message)?;
  Ok(())
}
