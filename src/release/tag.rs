//! Release tag naming

/// Tag for a version string
///
/// Parentheses are dropped, runs of whitespace become a single `-`, and the
/// result is prefixed with `v`: `1.2 (beta)` becomes `v1.2-beta`.
pub fn tag_for_version(version: &str) -> String {
  let stripped: String = version.chars().filter(|c| *c != '(' && *c != ')').collect();
  let joined = stripped.split_whitespace().collect::<Vec<_>>().join("-");
  format!("v{}", joined)
}
