//! Metadata store adapter: load the canonical record, rewrite derived files

use crate::core::config::ReleaseConfig;
use crate::core::error::{ReleaseResult, ResultExt};
use crate::metadata::derived::{DerivedFile, DerivedFileDescriptor, FieldValues};
use crate::metadata::record::ProjectMetadata;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads and writes the canonical record and its derived copies under a project root
pub struct MetadataStore<'a> {
  root: &'a Path,
  config: &'a ReleaseConfig,
}

/// A derived file whose content changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiedFile {
  pub kind: DerivedFile,
  pub path: PathBuf,
}

impl<'a> MetadataStore<'a> {
  pub fn new(root: &'a Path, config: &'a ReleaseConfig) -> Self {
    Self { root, config }
  }

  /// Load the canonical record
  pub fn load(&self) -> ReleaseResult<ProjectMetadata> {
    ProjectMetadata::load(&self.root.join(&self.config.files.codemeta))
  }

  /// Descriptors rewritten on every version bump
  pub fn version_descriptors(&self, meta: &ProjectMetadata) -> ReleaseResult<Vec<DerivedFileDescriptor>> {
    let files = &self.config.files;
    Ok(vec![
      DerivedFileDescriptor::record_dates(&files.codemeta)?,
      DerivedFileDescriptor::package_init(&files.init_file_for(&meta.identifier))?,
      DerivedFileDescriptor::citation_release(&files.citation)?,
      DerivedFileDescriptor::sample_workflow(&files.sample_workflow)?,
    ])
  }

  /// Files staged by the version-bump commit
  pub fn version_files(&self, meta: &ProjectMetadata) -> Vec<PathBuf> {
    let files = &self.config.files;
    vec![
      files.codemeta.clone(),
      files.init_file_for(&meta.identifier),
      files.citation.clone(),
      files.sample_workflow.clone(),
    ]
  }

  /// Regenerate every derived file from `meta`
  pub fn propagate(&self, meta: &ProjectMetadata, today: &str) -> ReleaseResult<Vec<ModifiedFile>> {
    let descriptors = self.version_descriptors(meta)?;
    self.apply(&descriptors, &FieldValues::for_release(meta, today))
  }

  /// Apply `descriptors` to their files
  ///
  /// Each file is rendered completely in memory before it is written, so a
  /// drift never leaves a half-edited file. Without `transactional`, files
  /// earlier in the batch stay written when a later one drifts.
  pub fn apply(&self, descriptors: &[DerivedFileDescriptor], values: &FieldValues) -> ReleaseResult<Vec<ModifiedFile>> {
    let mut modified = Vec::new();

    if self.config.transactional {
      let mut rendered = Vec::with_capacity(descriptors.len());
      for descriptor in descriptors {
        rendered.push((descriptor, self.render(descriptor, values)?));
      }
      for (descriptor, render) in rendered {
        if let Some(file) = self.write_if_changed(descriptor, render)? {
          modified.push(file);
        }
      }
      return Ok(modified);
    }

    for descriptor in descriptors {
      let render = self.render(descriptor, values)?;
      if let Some(file) = self.write_if_changed(descriptor, render)? {
        modified.push(file);
      }
    }

    Ok(modified)
  }

  /// Current value of each anchor of a derived file (for drift reporting)
  pub fn inspect(&self, descriptor: &DerivedFileDescriptor) -> ReleaseResult<Vec<(&'static str, Option<String>)>> {
    let path = self.root.join(&descriptor.path);
    let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(descriptor.inspect(&text))
  }

  fn render(&self, descriptor: &DerivedFileDescriptor, values: &FieldValues) -> ReleaseResult<Rendered> {
    let path = self.root.join(&descriptor.path);
    let before = fs::read_to_string(&path)
      .with_context(|| format!("Failed to read {} ({})", path.display(), descriptor.kind))?;
    let after = descriptor.apply(&before, values)?;
    Ok(Rendered { path, before, after })
  }

  fn write_if_changed(&self, descriptor: &DerivedFileDescriptor, rendered: Rendered) -> ReleaseResult<Option<ModifiedFile>> {
    if rendered.before == rendered.after {
      log::debug!("{} already up to date", descriptor.path.display());
      return Ok(None);
    }

    let backup = backup_path(&rendered.path);
    fs::write(&backup, &rendered.before).with_context(|| format!("Failed to write backup {}", backup.display()))?;
    fs::write(&rendered.path, &rendered.after)
      .with_context(|| format!("Failed to write {}", rendered.path.display()))?;

    log::info!("updated {} (backup at {})", descriptor.path.display(), backup.display());
    Ok(Some(ModifiedFile {
      kind: descriptor.kind,
      path: descriptor.path.clone(),
    }))
  }
}

struct Rendered {
  path: PathBuf,
  before: String,
  after: String,
}

/// `<file>.bak` next to the file
pub fn backup_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".bak");
  path.with_file_name(name)
}
