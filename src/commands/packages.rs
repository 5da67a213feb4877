//! Package commands: build and check, optionally followed by an upload

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::package::{PackageBuilder, PackageIndex};

fn builder(ctx: &ReleaseContext) -> PackageBuilder<'_> {
  PackageBuilder::new(
    &ctx.root,
    &ctx.config.packaging,
    &ctx.metadata.identifier,
    &ctx.metadata.version,
  )
}

/// `doi-release packages`
pub fn run_packages(ctx: &ReleaseContext) -> ReleaseResult<()> {
  let artifacts = builder(ctx).build(true)?;
  println!();
  println!("✅ {} distribution file(s) ready", artifacts.len());
  println!("💡 Upload with `doi-release test-pypi`, then `doi-release pypi`");
  Ok(())
}

/// `doi-release test-pypi` / `doi-release pypi`
pub fn run_upload(ctx: &ReleaseContext, index: PackageIndex) -> ReleaseResult<()> {
  let builder = builder(ctx);
  let artifacts = builder.build(true)?;
  builder.upload(&artifacts, index)?;
  Ok(())
}
