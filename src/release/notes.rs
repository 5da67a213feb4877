//! Release notes drafted in the operator's editor

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt, ToolError};
use std::process::Command;
use tempfile::NamedTempFile;

/// Editor command line: `configured`, else $VISUAL, else $EDITOR, else `vi`
///
/// Values are split on whitespace so `code --wait` works.
pub fn resolve_editor(configured: Option<&str>, visual: Option<String>, editor: Option<String>) -> Vec<String> {
  let chosen = configured
    .map(str::to_string)
    .or(visual)
    .or(editor)
    .filter(|e| !e.trim().is_empty())
    .unwrap_or_else(|| "vi".to_string());

  chosen.split_whitespace().map(str::to_string).collect()
}

/// Create the scratch file and block until the editor exits
///
/// The file is removed when the returned handle is dropped. Empty notes are
/// allowed and produce a release with an empty body.
pub fn draft_release_notes(identifier: &str, configured_editor: Option<&str>) -> ReleaseResult<NamedTempFile> {
  let notes = tempfile::Builder::new()
    .prefix(&format!("release-notes-{}-", identifier))
    .suffix(".md")
    .tempfile()
    .context("Failed to create release notes file")?;

  let editor = resolve_editor(
    configured_editor,
    std::env::var("VISUAL").ok(),
    std::env::var("EDITOR").ok(),
  );
  let editor_line = editor.join(" ");
  let (program, args) = editor.split_first().ok_or_else(|| ReleaseError::message("Empty editor command"))?;

  println!("📝 Opening {} in {} (save and quit to continue)...", notes.path().display(), editor_line);
  log::debug!("running (attached): {} {}", editor_line, notes.path().display());

  let status = Command::new(program)
    .args(args)
    .arg(notes.path())
    .status()
    .map_err(|e| {
      ReleaseError::Tool(ToolError::Editor {
        editor: editor_line.clone(),
        reason: e.to_string(),
      })
    })?;

  if !status.success() {
    return Err(ReleaseError::Tool(ToolError::Editor {
      editor: editor_line,
      reason: format!("exited with {}", status),
    }));
  }

  let size = std::fs::metadata(notes.path()).map(|m| m.len()).unwrap_or(0);
  if size == 0 {
    println!("   ⚠️  Release notes are empty; the release will have no description");
  }

  Ok(notes)
}
