//! Research-data archive client (InvenioRDM records API)
//!
//! The archive's "latest version" answer changes every time a release is
//! archived, so nothing here is cached: each call goes to the network, and
//! no call is retried.

use crate::core::error::{ReleaseError, ReleaseResult};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Where a record lives, derived from the project's `relatedLink`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLocation {
  /// Everything before `/records/`, e.g. `https://data.caltech.edu`
  pub base_url: String,
  /// Final path segment of the link, e.g. `abc12-de345`
  pub record_id: String,
}

impl ArchiveLocation {
  /// Split a record link into archive base and record id
  pub fn from_related_link(link: &str) -> ReleaseResult<Self> {
    let lookup_error = |reason: &str| ReleaseError::ArchiveLookup {
      url: link.to_string(),
      reason: reason.to_string(),
    };

    let url = Url::parse(link.trim()).map_err(|e| lookup_error(&format!("not a valid URL ({})", e)))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
      return Err(lookup_error("link has no host"));
    }

    let segments: Vec<&str> = url
      .path_segments()
      .map(|s| s.filter(|seg| !seg.is_empty()).collect())
      .unwrap_or_default();

    let record_id = segments
      .last()
      .map(|s| s.to_string())
      .ok_or_else(|| lookup_error("link has no record id"))?;

    let origin = url.origin().ascii_serialization();
    let base_url = match segments.iter().position(|s| *s == "records") {
      Some(0) | None => origin,
      Some(idx) => format!("{}/{}", origin, segments[..idx].join("/")),
    };

    Ok(Self { base_url, record_id })
  }

  /// `GET` endpoint listing every version of this record
  pub fn versions_url(&self) -> String {
    format!("{}/api/records/{}/versions", self.base_url, self.record_id)
  }

  /// Canonical landing page of `record_id` in this archive
  pub fn record_url(&self, record_id: &str) -> String {
    format!("{}/records/{}", self.base_url, record_id)
  }
}

/// Most recent version of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestIdentifier {
  pub record_id: String,
  pub doi: String,
}

#[derive(Debug, Deserialize)]
struct VersionsResponse {
  hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
  #[serde(default)]
  hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
  #[serde(default)]
  id: Option<String>,
  #[serde(default)]
  pids: Option<Pids>,
}

#[derive(Debug, Deserialize)]
struct Pids {
  doi: Option<Pid>,
}

#[derive(Debug, Deserialize)]
struct Pid {
  identifier: String,
}

/// Pick the first hit (the archive lists newest first)
fn parse_versions(body: &str) -> Result<LatestIdentifier, String> {
  let response: VersionsResponse = serde_json::from_str(body).map_err(|e| format!("unexpected response: {}", e))?;
  let hit = response.hits.hits.into_iter().next().ok_or("no versions returned")?;

  let doi = hit
    .pids
    .and_then(|p| p.doi)
    .map(|d| d.identifier)
    .filter(|d| !d.is_empty())
    .ok_or("latest version has no DOI")?;

  let record_id = hit
    .id
    .filter(|id| !id.is_empty())
    .unwrap_or_else(|| record_id_from_doi(&doi));

  Ok(LatestIdentifier { record_id, doi })
}

/// `10.22002/abc12-de345` -> `abc12-de345`
pub fn record_id_from_doi(doi: &str) -> String {
  doi.rsplit('/').next().unwrap_or(doi).to_string()
}

/// Blocking HTTP client for the archive
pub struct ArchiveClient {
  http: reqwest::blocking::Client,
}

impl ArchiveClient {
  pub fn new(timeout_secs: u64) -> ReleaseResult<Self> {
    let http = reqwest::blocking::Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| ReleaseError::message(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self { http })
  }

  /// Resolve the newest version's DOI for the record behind `related_link`
  pub fn fetch_latest_identifier(&self, related_link: &str) -> ReleaseResult<(ArchiveLocation, LatestIdentifier)> {
    let location = ArchiveLocation::from_related_link(related_link)?;
    let url = location.versions_url();
    let lookup_error = |reason: String| ReleaseError::ArchiveLookup {
      url: url.clone(),
      reason,
    };

    log::debug!("GET {}", url);
    let response = self
      .http
      .get(&url)
      .header(reqwest::header::ACCEPT, "application/json")
      .send()
      .map_err(|e| lookup_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(lookup_error(format!("HTTP {}", status)));
    }

    let body = response.text().map_err(|e| lookup_error(e.to_string()))?;
    let latest = parse_versions(&body).map_err(lookup_error)?;
    log::info!("latest version of {} is {} ({})", location.record_id, latest.record_id, latest.doi);

    Ok((location, latest))
  }
}
