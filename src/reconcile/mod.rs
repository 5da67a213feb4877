//! Post-release reconciliation of the archive's DOI into project metadata
//!
//! After a release is archived, the archive assigns the new version its own
//! record id and DOI. The citation file, the readme badges and the
//! record's `relatedLink` are rewritten to point at it.

use crate::archive::{ArchiveClient, ArchiveLocation, LatestIdentifier};
use crate::core::config::ReleaseConfig;
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::metadata::{DerivedFileDescriptor, FieldValues, MetadataStore, ModifiedFile, ProjectMetadata, field};
use std::path::PathBuf;

/// Outcome of a reconciliation
#[derive(Debug, Clone)]
pub struct Reconciled {
  /// Input metadata with `related_link` pointing at the newest record
  pub metadata: ProjectMetadata,
  pub doi: String,
  pub modified: Vec<ModifiedFile>,
}

/// Descriptors rewritten when the DOI changes
pub fn doi_descriptors(config: &ReleaseConfig) -> ReleaseResult<Vec<DerivedFileDescriptor>> {
  let files = &config.files;
  Ok(vec![
    DerivedFileDescriptor::citation_doi(&files.citation)?,
    DerivedFileDescriptor::readme_records(&files.readme)?,
    DerivedFileDescriptor::record_related_link(&files.codemeta)?,
  ])
}

/// Files staged by the DOI commit
pub fn doi_files(config: &ReleaseConfig) -> Vec<PathBuf> {
  let files = &config.files;
  vec![files.citation.clone(), files.readme.clone(), files.codemeta.clone()]
}

/// Rewrite the DOI files for an already-resolved identifier
pub fn apply_identifier(
  store: &MetadataStore<'_>,
  config: &ReleaseConfig,
  meta: &ProjectMetadata,
  location: &ArchiveLocation,
  latest: &LatestIdentifier,
) -> ReleaseResult<Reconciled> {
  let related_link = location.record_url(&latest.record_id);
  let values = FieldValues::new()
    .with(field::DOI, &latest.doi)
    .with(field::RECORD_ID, &latest.record_id)
    .with(field::RELATED_LINK, &related_link);

  let modified = store.apply(&doi_descriptors(config)?, &values)?;

  let mut metadata = meta.clone();
  metadata.related_link = related_link;
  Ok(Reconciled {
    metadata,
    doi: latest.doi.clone(),
    modified,
  })
}

/// Look up the newest DOI for the project's record and write it into the metadata files
pub fn reconcile_doi(ctx: &ReleaseContext) -> ReleaseResult<Reconciled> {
  println!("🔎 Looking up the latest archived version of {}...", ctx.metadata.related_link);
  let client = ArchiveClient::new(ctx.config.archive_timeout_secs)?;
  let (location, latest) = client.fetch_latest_identifier(&ctx.metadata.related_link)?;
  println!("   📌 {} (record {})", latest.doi, latest.record_id);

  let reconciled = apply_identifier(&ctx.store(), &ctx.config, &ctx.metadata, &location, &latest)?;
  if reconciled.modified.is_empty() {
    println!("   ℹ️  DOI already up to date");
  }
  for file in &reconciled.modified {
    println!("   ✏️  {} ({})", file.path.display(), file.kind);
  }
  Ok(reconciled)
}
