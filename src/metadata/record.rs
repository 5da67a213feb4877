//! Canonical metadata record (codemeta.json)

use crate::core::error::{MetadataError, ReleaseError, ReleaseResult};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Primary author of the project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Person {
  pub name: String,
  pub given_name: String,
  pub family_name: String,
  pub email: String,
}

/// The single source of truth every derived file is regenerated from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectMetadata {
  pub name: String,
  /// Lowercase program name; also the Python package directory
  pub identifier: String,
  pub version: String,
  pub url: String,
  pub license: String,
  pub description: String,
  pub author: Person,
  /// Link to the archived copy of the software in the DOI-issuing repository
  pub related_link: String,
}

impl ProjectMetadata {
  /// Load the record from `path`
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    if !path.exists() {
      return Err(ReleaseError::Metadata(MetadataError::NotFound {
        path: path.to_path_buf(),
      }));
    }

    let content = fs::read_to_string(path)?;
    Self::from_json_str(&content, path)
  }

  /// Parse codemeta JSON; `path` is only used in error messages
  pub fn from_json_str(content: &str, path: &Path) -> ReleaseResult<Self> {
    let doc: Value = serde_json::from_str(content).map_err(|e| {
      ReleaseError::Metadata(MetadataError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
      })
    })?;

    let required = |field: &str| -> ReleaseResult<String> {
      match string_field(&doc, field) {
        Some(value) => Ok(value),
        None => Err(ReleaseError::Metadata(MetadataError::MissingField {
          path: path.to_path_buf(),
          field: field.to_string(),
        })),
      }
    };

    let name = required("name")?;
    let identifier = required("identifier")?;
    let version = required("version")?;
    let related_link = required("relatedLink")?;

    let url = string_field(&doc, "url")
      .or_else(|| string_field(&doc, "codeRepository"))
      .unwrap_or_default();

    Ok(Self {
      name,
      identifier,
      version,
      url,
      license: string_field(&doc, "license").unwrap_or_default(),
      description: string_field(&doc, "description").unwrap_or_default(),
      author: first_author(&doc),
      related_link,
    })
  }

  /// Whether `version` parses as a semantic version
  pub fn has_semver_version(&self) -> bool {
    semver::Version::parse(&self.version).is_ok()
  }
}

/// Non-empty string value of `field`; a list yields its first string entry
fn string_field(doc: &Value, field: &str) -> Option<String> {
  let value = match doc.get(field)? {
    Value::String(s) => s.trim().to_string(),
    Value::Array(items) => items.iter().find_map(|v| v.as_str())?.trim().to_string(),
    _ => return None,
  };

  if value.is_empty() { None } else { Some(value) }
}

fn first_author(doc: &Value) -> Person {
  let author = match doc.get("author") {
    Some(Value::Array(items)) => items.first(),
    Some(obj @ Value::Object(_)) => Some(obj),
    _ => None,
  };

  let Some(author) = author else {
    return Person::default();
  };

  let given_name = string_field(author, "givenName").unwrap_or_default();
  let family_name = string_field(author, "familyName").unwrap_or_default();
  let name = string_field(author, "name").unwrap_or_else(|| {
    [given_name.as_str(), family_name.as_str()]
      .into_iter()
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  });

  Person {
    name,
    given_name,
    family_name,
    email: string_field(author, "email").unwrap_or_default(),
  }
}
