//! DOI commands: rewrite the archive's newest DOI into the metadata files

use crate::core::context::ReleaseContext;
use crate::core::error::{PreconditionError, ReleaseError, ReleaseResult};
use crate::reconcile::{self, doi_files};
use crate::release::sequencer;
use std::path::PathBuf;

/// `doi-release update-doi`
pub fn run_update_doi(ctx: &ReleaseContext) -> ReleaseResult<()> {
  reconcile::reconcile_doi(ctx)?;
  Ok(())
}

/// `doi-release post-release`: rewrite, commit if anything changed, push
pub fn run_post_release(ctx: &ReleaseContext) -> ReleaseResult<()> {
  let files: Vec<PathBuf> = doi_files(&ctx.config)
    .into_iter()
    .filter(|p| ctx.root.join(p).exists())
    .collect();

  // The commit below stages these files whole, so unrelated edits would ride along
  if !ctx.git.is_working_tree_clean(&files)? {
    return Err(ReleaseError::Precondition(PreconditionError::DirtyTree { paths: files }));
  }

  let reconciled = reconcile::reconcile_doi(ctx)?;

  println!("📋 Committing DOI update...");
  let message = format!("chore: update DOI to {}", reconciled.doi);
  if sequencer::commit_if_changed(ctx, &files, &message)?.is_none() {
    println!();
    println!("✅ {} already points at {}", ctx.metadata.name, reconciled.metadata.related_link);
    return Ok(());
  }

  println!("📤 Pushing to {}...", ctx.config.remote);
  ctx.git.push_all(&ctx.config.remote)?;

  println!();
  println!("🎉 {} now points at {}", ctx.metadata.name, reconciled.metadata.related_link);
  Ok(())
}
