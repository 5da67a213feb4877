//! Derived file descriptors
//!
//! A descriptor declares, as data, which line-anchored regions of a file carry
//! which metadata field. `DerivedFileDescriptor::apply` is the only code that
//! edits derived text; it works on strings so it can be exercised without
//! touching disk.
//!
//! Pattern convention: capture group 1 is the prefix that is kept, the rest of
//! the match is the value region that gets replaced.

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::metadata::record::ProjectMetadata;
use crate::utils::{python_quote, yaml_quote};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Files regenerated from the canonical record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DerivedFile {
  /// `<identifier>/__init__.py`
  PackageInit,
  /// `CITATION.cff`
  Citation,
  /// `sample-workflow.yml`
  SampleWorkflow,
  /// `README.md`
  Readme,
  /// `codemeta.json` itself (dates and links only)
  CanonicalRecord,
}

impl fmt::Display for DerivedFile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      DerivedFile::PackageInit => "package init file",
      DerivedFile::Citation => "citation file",
      DerivedFile::SampleWorkflow => "sample workflow",
      DerivedFile::Readme => "readme",
      DerivedFile::CanonicalRecord => "metadata record",
    };
    write!(f, "{}", name)
  }
}

/// How a value is written into its region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
  /// `'value'`
  Python,
  /// `"value"`
  Yaml,
  /// JSON string literal
  Json,
  /// Written as-is
  Bare,
}

impl Quoting {
  fn render(self, value: &str) -> String {
    match self {
      Quoting::Python => python_quote(value),
      Quoting::Yaml => yaml_quote(value),
      Quoting::Json => serde_json::Value::String(value.to_string()).to_string(),
      Quoting::Bare => value.to_string(),
    }
  }

  fn unquote(self, region: &str) -> String {
    let region = region.trim();
    match self {
      Quoting::Json => serde_json::from_str::<String>(region).unwrap_or_else(|_| region.to_string()),
      Quoting::Bare => region.to_string(),
      Quoting::Python | Quoting::Yaml => {
        let quote = if region.starts_with('\'') { '\'' } else { '"' };
        match region.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
          Some(inner) => inner.replace(&format!("\\{}", quote), &quote.to_string()).replace("\\\\", "\\"),
          None => region.to_string(),
        }
      }
    }
  }
}

/// Field names understood by the anchors
pub mod field {
  pub const NAME: &str = "name";
  pub const VERSION: &str = "version";
  pub const DESCRIPTION: &str = "description";
  pub const URL: &str = "url";
  pub const AUTHOR: &str = "author";
  pub const GIVEN_NAME: &str = "given-names";
  pub const FAMILY_NAME: &str = "family-names";
  pub const EMAIL: &str = "email";
  pub const LICENSE: &str = "license";
  pub const DATE_RELEASED: &str = "date-released";
  pub const DATE_PUBLISHED: &str = "datePublished";
  pub const DOI: &str = "doi";
  pub const RECORD_ID: &str = "record-id";
  pub const RELATED_LINK: &str = "relatedLink";
}

/// One designated region of a derived file
#[derive(Debug, Clone)]
pub struct Anchor {
  pub field: &'static str,
  pattern: Regex,
  quoting: Quoting,
  /// Missing required anchors are schema drift; missing optional ones are skipped
  pub required: bool,
  /// Replace every match instead of the first
  pub replace_all: bool,
}

impl Anchor {
  pub fn new(field: &'static str, pattern: &str, quoting: Quoting) -> ReleaseResult<Self> {
    Ok(Self {
      field,
      pattern: Regex::new(pattern)?,
      quoting,
      required: true,
      replace_all: false,
    })
  }

  pub fn optional(mut self) -> Self {
    self.required = false;
    self
  }

  pub fn all_occurrences(mut self) -> Self {
    self.replace_all = true;
    self
  }

  /// Current value held by the first match, unquoted
  pub fn current_value(&self, text: &str) -> Option<String> {
    let caps = self.pattern.captures(text)?;
    let whole = caps.get(0)?;
    let prefix = caps.get(1)?;
    let region = &text[prefix.end()..whole.end()];
    Some(self.quoting.unquote(region))
  }

  fn replace(&self, text: &str, value: &str) -> Option<String> {
    if !self.pattern.is_match(text) {
      return None;
    }

    let rendered = self.quoting.render(value);
    let replacer = |caps: &Captures| format!("{}{}", &caps[1], rendered);
    let out = if self.replace_all {
      self.pattern.replace_all(text, replacer)
    } else {
      self.pattern.replace(text, replacer)
    };
    Some(out.into_owned())
  }
}

/// Values keyed by anchor field name
#[derive(Debug, Clone, Default)]
pub struct FieldValues(BTreeMap<&'static str, String>);

impl FieldValues {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, field: &'static str, value: impl Into<String>) -> Self {
    self.0.insert(field, value.into());
    self
  }

  pub fn get(&self, field: &str) -> Option<&str> {
    self.0.get(field).map(String::as_str)
  }

  /// Insert `value` only when it is non-empty
  pub fn with_nonempty(self, field: &'static str, value: &str) -> Self {
    if value.is_empty() { self } else { self.with(field, value) }
  }

  /// Values carried by a version bump
  pub fn for_release(meta: &ProjectMetadata, today: &str) -> Self {
    Self::new()
      .with(field::NAME, &meta.name)
      .with(field::VERSION, &meta.version)
      .with(field::DESCRIPTION, &meta.description)
      .with(field::URL, &meta.url)
      .with(field::AUTHOR, &meta.author.name)
      .with(field::EMAIL, &meta.author.email)
      .with(field::LICENSE, &meta.license)
      .with_nonempty(field::GIVEN_NAME, &meta.author.given_name)
      .with_nonempty(field::FAMILY_NAME, &meta.author.family_name)
      .with(field::DATE_RELEASED, today)
      .with(field::DATE_PUBLISHED, today)
  }
}

/// Rewrite the region of every anchor in `text`, reporting drift against `file`
///
/// Returns `SchemaDrift` on the first required anchor that does not match;
/// the input is never partially rewritten. Optional anchors without a value
/// are left as they are.
pub fn apply_anchors(file: &Path, text: &str, anchors: &[Anchor], values: &FieldValues) -> ReleaseResult<String> {
  let mut out = text.to_string();

  for anchor in anchors {
    let value = match values.get(anchor.field) {
      Some(value) => value,
      None if !anchor.required => {
        log::debug!("no value for optional `{}` anchor in {}", anchor.field, file.display());
        continue;
      }
      None => {
        return Err(ReleaseError::message(format!(
          "No value supplied for `{}` in {}",
          anchor.field,
          file.display()
        )));
      }
    };

    match anchor.replace(&out, value) {
      Some(updated) => out = updated,
      None if anchor.required => {
        return Err(ReleaseError::SchemaDrift {
          file: file.to_path_buf(),
          field: anchor.field.to_string(),
        });
      }
      None => log::debug!("optional `{}` anchor absent in {}", anchor.field, file.display()),
    }
  }

  Ok(out)
}

/// A derived file and the regions it must contain
#[derive(Debug, Clone)]
pub struct DerivedFileDescriptor {
  pub kind: DerivedFile,
  /// Path relative to the project root
  pub path: PathBuf,
  pub anchors: Vec<Anchor>,
}

impl DerivedFileDescriptor {
  /// Apply every anchor to `text`
  pub fn apply(&self, text: &str, values: &FieldValues) -> ReleaseResult<String> {
    apply_anchors(&self.path, text, &self.anchors, values)
  }

  /// Read back the current value of each anchor, in anchor order
  ///
  /// Several anchors may carry the same field (`url` and `repository-code`
  /// both hold the url), so the result is one entry per anchor.
  pub fn inspect(&self, text: &str) -> Vec<(&'static str, Option<String>)> {
    self.anchors.iter().map(|a| (a.field, a.current_value(text))).collect()
  }

  /// `__version__ = '...'` and friends
  pub fn package_init(path: &Path) -> ReleaseResult<Self> {
    let dunder = |field: &'static str, name: &str| {
      Anchor::new(field, &format!(r"(?m)^(__{}__[ \t]*=[ \t]*)[^\r\n]*", name), Quoting::Python)
    };

    Ok(Self {
      kind: DerivedFile::PackageInit,
      path: path.to_path_buf(),
      anchors: vec![
        dunder(field::VERSION, "version")?,
        dunder(field::DESCRIPTION, "description")?,
        dunder(field::URL, "url")?,
        dunder(field::AUTHOR, "author")?,
        dunder(field::EMAIL, "email")?,
        dunder(field::LICENSE, "license")?,
      ],
    })
  }

  /// Release fields of CITATION.cff
  ///
  /// `version:` and `date-released:` must be there. The descriptive keys and
  /// the first author's names are rewritten when the file carries them.
  pub fn citation_release(path: &Path) -> ReleaseResult<Self> {
    let key = |field: &'static str, name: &str| {
      Anchor::new(field, &format!(r"(?m)^({}:[ \t]*)[^\r\n]*", name), Quoting::Yaml)
    };
    let author = |field: &'static str| {
      Anchor::new(field, &format!(r"(?m)^([ \t]*-?[ \t]*{}:[ \t]*)[^\r\n]*", field), Quoting::Yaml)
    };

    Ok(Self {
      kind: DerivedFile::Citation,
      path: path.to_path_buf(),
      anchors: vec![
        key(field::VERSION, "version")?,
        Anchor::new(field::DATE_RELEASED, r"(?m)^(date-released:[ \t]*)[^\r\n]*", Quoting::Bare)?,
        key(field::NAME, "title")?.optional(),
        key(field::DESCRIPTION, "abstract")?.optional(),
        key(field::URL, "url")?.optional(),
        key(field::URL, "repository-code")?.optional(),
        key(field::LICENSE, "license-url")?.optional(),
        author(field::FAMILY_NAME)?.optional(),
        author(field::GIVEN_NAME)?.optional(),
      ],
    })
  }

  /// First `version:` key in the sample workflow
  pub fn sample_workflow(path: &Path) -> ReleaseResult<Self> {
    Ok(Self {
      kind: DerivedFile::SampleWorkflow,
      path: path.to_path_buf(),
      anchors: vec![Anchor::new(field::VERSION, r"(?m)^([ \t]*version:[ \t]*)[^\r\n]*", Quoting::Yaml)?],
    })
  }

  /// `"datePublished"` in codemeta.json, when present
  pub fn record_dates(path: &Path) -> ReleaseResult<Self> {
    Ok(Self {
      kind: DerivedFile::CanonicalRecord,
      path: path.to_path_buf(),
      anchors: vec![
        Anchor::new(field::DATE_PUBLISHED, r#"(?m)^([ \t]*"datePublished"[ \t]*:[ \t]*)"[^"]*""#, Quoting::Json)?
          .optional(),
      ],
    })
  }

  /// `doi:` in CITATION.cff
  pub fn citation_doi(path: &Path) -> ReleaseResult<Self> {
    Ok(Self {
      kind: DerivedFile::Citation,
      path: path.to_path_buf(),
      anchors: vec![Anchor::new(field::DOI, r"(?m)^(doi:[ \t]*)[^\r\n]*", Quoting::Bare)?],
    })
  }

  /// Every record id in the readme: `records/xxxxx-xxxxx` links and
  /// `10.NNNN/xxxxx-xxxxx` DOIs, plain or URL-encoded (`10.NNNN%2Fxxxxx-xxxxx`)
  pub fn readme_records(path: &Path) -> ReleaseResult<Self> {
    Ok(Self {
      kind: DerivedFile::Readme,
      path: path.to_path_buf(),
      anchors: vec![
        Anchor::new(field::RECORD_ID, r"(records/)[a-z0-9]{5}-[a-z0-9]{5}\b", Quoting::Bare)?
          .optional()
          .all_occurrences(),
        Anchor::new(field::RECORD_ID, r"(?i)(\b10\.\d{4,9}(?:/|%2F))[a-z0-9]{5}-[a-z0-9]{5}\b", Quoting::Bare)?
          .optional()
          .all_occurrences(),
      ],
    })
  }

  /// `"relatedLink"` in codemeta.json (plain string or first list entry)
  pub fn record_related_link(path: &Path) -> ReleaseResult<Self> {
    Ok(Self {
      kind: DerivedFile::CanonicalRecord,
      path: path.to_path_buf(),
      anchors: vec![Anchor::new(
        field::RELATED_LINK,
        r#"(?m)^([ \t]*"relatedLink"[ \t]*:[ \t]*(?:\[\s*)?)"[^"]*""#,
        Quoting::Json,
      )?],
    })
  }
}
