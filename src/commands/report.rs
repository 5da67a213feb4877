//! Report command: what a release would use, and whether the derived files agree

use crate::archive::{ArchiveClient, ArchiveLocation};
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::metadata::{DerivedFileDescriptor, FieldValues, field};
use crate::release::tag_for_version;
use serde::Serialize;
use std::path::PathBuf;

/// Archive lookup results; failures are recorded, not raised
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArchiveStatus {
  pub base_url: Option<String>,
  pub record_id: Option<String>,
  pub latest_doi: Option<String>,
  pub error: Option<String>,
}

/// Sync state of one derived file
#[derive(Debug, Clone, Serialize)]
pub struct DerivedStatus {
  pub path: PathBuf,
  pub kind: String,
  /// Fields whose current value differs from the canonical record
  pub stale: Vec<String>,
  /// Required anchors that could not be found
  pub missing: Vec<String>,
  pub error: Option<String>,
}

impl DerivedStatus {
  pub fn in_sync(&self) -> bool {
    self.stale.is_empty() && self.missing.is_empty() && self.error.is_none()
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
  pub name: String,
  pub identifier: String,
  pub version: String,
  pub tag: String,
  pub branch: String,
  pub repo_url: Option<String>,
  pub related_link: String,
  pub archive: ArchiveStatus,
  pub derived: Vec<DerivedStatus>,
  /// Version files with edits not yet committed
  pub uncommitted: bool,
}

/// Compare a derived file against the record
///
/// Dates are not compared; every release rewrites them.
fn derived_status(ctx: &ReleaseContext, descriptor: &DerivedFileDescriptor, expected: &FieldValues) -> DerivedStatus {
  let mut status = DerivedStatus {
    path: descriptor.path.clone(),
    kind: descriptor.kind.to_string(),
    stale: Vec::new(),
    missing: Vec::new(),
    error: None,
  };

  let current = match ctx.store().inspect(descriptor) {
    Ok(values) => values,
    Err(e) => {
      status.error = Some(e.to_string());
      return status;
    }
  };

  for (anchor, (_, value)) in descriptor.anchors.iter().zip(current) {
    match value {
      None if anchor.required => status.missing.push(anchor.field.to_string()),
      None => {}
      Some(_) if anchor.field == field::DATE_RELEASED || anchor.field == field::DATE_PUBLISHED => {}
      Some(value) => {
        let stale = match expected.get(anchor.field) {
          Some(want) => want != value,
          None => false,
        };
        if stale && !status.stale.iter().any(|f| f == anchor.field) {
          status.stale.push(anchor.field.to_string());
        }
      }
    }
  }

  status
}

fn archive_status(ctx: &ReleaseContext) -> ArchiveStatus {
  let mut status = ArchiveStatus::default();

  match ArchiveLocation::from_related_link(&ctx.metadata.related_link) {
    Ok(location) => {
      status.base_url = Some(location.base_url);
      status.record_id = Some(location.record_id);
    }
    Err(e) => {
      status.error = Some(e.to_string());
      return status;
    }
  }

  let lookup = ArchiveClient::new(ctx.config.archive_timeout_secs)
    .and_then(|client| client.fetch_latest_identifier(&ctx.metadata.related_link));
  match lookup {
    Ok((_, latest)) => status.latest_doi = Some(latest.doi),
    Err(e) => status.error = Some(e.to_string()),
  }

  status
}

/// Gather the report without failing on lookup problems
pub fn build_report(ctx: &ReleaseContext) -> ReleaseResult<Report> {
  let meta = &ctx.metadata;
  let store = ctx.store();
  let expected = FieldValues::for_release(meta, &ctx.today);

  let derived = store
    .version_descriptors(meta)?
    .iter()
    .map(|d| derived_status(ctx, d, &expected))
    .collect();

  let version_files: Vec<PathBuf> = store
    .version_files(meta)
    .into_iter()
    .filter(|p| ctx.root.join(p).exists())
    .collect();
  let uncommitted = !ctx.git.is_working_tree_clean(&version_files)?;

  Ok(Report {
    name: meta.name.clone(),
    identifier: meta.identifier.clone(),
    version: meta.version.clone(),
    tag: tag_for_version(&meta.version),
    branch: ctx.branch.clone(),
    repo_url: ctx.remote_url.clone(),
    related_link: meta.related_link.clone(),
    archive: archive_status(ctx),
    derived,
    uncommitted,
  })
}

/// `doi-release report`
pub fn run_report(ctx: &ReleaseContext, json: bool) -> ReleaseResult<()> {
  let report = build_report(ctx)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
    return Ok(());
  }

  print_report(&report);
  Ok(())
}

fn print_report(report: &Report) {
  let unknown = "(unknown)";
  let archive = &report.archive;

  println!("📦 {} ({})", report.name, report.identifier);
  println!("   Version:        {}", report.version);
  println!("   Tag:            {}", report.tag);
  println!("   Branch:         {}", report.branch);
  println!("   Repository:     {}", report.repo_url.as_deref().unwrap_or(unknown));
  println!("   Related link:   {}", report.related_link);
  println!();
  println!("🗄️  Archive");
  println!("   Base URL:       {}", archive.base_url.as_deref().unwrap_or(unknown));
  println!("   Record id:      {}", archive.record_id.as_deref().unwrap_or(unknown));
  match (&archive.latest_doi, &archive.error) {
    (Some(doi), _) => println!("   Latest DOI:     {}", doi),
    (None, Some(err)) => println!("   Latest DOI:     ⚠️  {}", err),
    (None, None) => println!("   Latest DOI:     {}", unknown),
  }
  println!();
  println!("📝 Derived files");
  for status in &report.derived {
    if status.in_sync() {
      println!("   ✅ {} ({})", status.path.display(), status.kind);
      continue;
    }
    println!("   ⚠️  {} ({})", status.path.display(), status.kind);
    if let Some(err) = &status.error {
      println!("      {}", err);
    }
    if !status.stale.is_empty() {
      println!("      stale: {}", status.stale.join(", "));
    }
    if !status.missing.is_empty() {
      println!("      missing: {}", status.missing.join(", "));
    }
  }
  if report.uncommitted {
    println!();
    println!("💡 Version files have uncommitted changes (`doi-release commit-updates`)");
  }
}
