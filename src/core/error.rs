//! Error types for doi-release with contextual messages and exit codes
//!
//! Every failure names the step and the file or command involved, plus a
//! suggestion where one exists. Nothing here is retried: a failed run leaves
//! the working tree as the last successful stage left it.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for doi-release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (wrong branch, aborted confirmation, bad metadata, config)
  User = 1,
  /// System error (git, gh, editor, network, I/O)
  System = 2,
  /// Validation failure (schema drift, package check)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for doi-release
#[derive(Debug)]
pub enum ReleaseError {
  /// A gate failed before anything was mutated
  Precondition(PreconditionError),

  /// Canonical metadata record could not be read
  Metadata(MetadataError),

  /// A derived file no longer contains the anchor it is expected to carry
  SchemaDrift { file: PathBuf, field: String },

  /// External tool exited non-zero
  Tool(ToolError),

  /// Archive API unreachable or returned nothing usable
  ArchiveLookup { url: String, reason: String },

  /// Built artifacts are missing or failed `twine check`
  PackageValidation { reason: String },

  /// Configuration errors
  Config(ConfigError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(e) => ReleaseError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Precondition(_) => ExitCode::User,
      ReleaseError::Metadata(_) => ExitCode::User,
      ReleaseError::SchemaDrift { .. } => ExitCode::Validation,
      ReleaseError::Tool(_) => ExitCode::System,
      ReleaseError::ArchiveLookup { .. } => ExitCode::System,
      ReleaseError::PackageValidation { .. } => ExitCode::Validation,
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Precondition(e) => e.help_message(),
      ReleaseError::Metadata(e) => e.help_message(),
      ReleaseError::SchemaDrift { file, field } => Some(format!(
        "Restore the `{}` line in {} (compare with its .bak copy or `git diff`), then re-run.",
        field,
        file.display()
      )),
      ReleaseError::Tool(e) => e.help_message(),
      ReleaseError::ArchiveLookup { .. } => Some(
        "Check that relatedLink in codemeta.json points at an existing record and that the archive is reachable."
          .to_string(),
      ),
      ReleaseError::PackageValidation { .. } => {
        Some("Fix the package metadata (setup.cfg / pyproject.toml) and run `doi-release packages` again.".to_string())
      }
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Precondition(e) => write!(f, "{}", e),
      ReleaseError::Metadata(e) => write!(f, "{}", e),
      ReleaseError::SchemaDrift { file, field } => {
        write!(f, "Schema drift in {}: expected `{}` anchor not found", file.display(), field)
      }
      ReleaseError::Tool(e) => write!(f, "{}", e),
      ReleaseError::ArchiveLookup { url, reason } => {
        write!(f, "Archive lookup failed for {}: {}", url, reason)
      }
      ReleaseError::PackageValidation { reason } => write!(f, "Package validation failed: {}", reason),
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<regex::Error> for ReleaseError {
  fn from(err: regex::Error) -> Self {
    ReleaseError::message(format!("Invalid anchor pattern: {}", err))
  }
}

impl From<glob::PatternError> for ReleaseError {
  fn from(err: glob::PatternError) -> Self {
    ReleaseError::message(format!("Invalid artifact pattern: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ReleaseError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ReleaseError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Convert anyhow::Error to ReleaseError
impl From<anyhow::Error> for ReleaseError {
  fn from(err: anyhow::Error) -> Self {
    ReleaseError::message(err.to_string())
  }
}

/// Gate failures that halt a run before any state changes
#[derive(Debug)]
pub enum PreconditionError {
  /// Not on the release branch
  WrongBranch { current: String, expected: String },

  /// Operator declined the version confirmation
  UserAborted { version: String },

  /// Files that are about to be committed have unrelated edits
  DirtyTree { paths: Vec<PathBuf> },

  /// Required executable is not on PATH
  ToolMissing { tool: String },
}

impl PreconditionError {
  fn help_message(&self) -> Option<String> {
    match self {
      PreconditionError::WrongBranch { expected, .. } => {
        Some(format!("Merge to `{}` and check it out before releasing.", expected))
      }
      PreconditionError::UserAborted { .. } => Some(
        "Update the \"version\" field in codemeta.json first, then run `doi-release release` again.".to_string(),
      ),
      PreconditionError::DirtyTree { .. } => {
        Some("Commit or stash the pending edits to these files, then re-run.".to_string())
      }
      PreconditionError::ToolMissing { tool } => Some(format!("Install `{}` and make sure it is on PATH.", tool)),
    }
  }
}

impl fmt::Display for PreconditionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PreconditionError::WrongBranch { current, expected } => {
        write!(f, "Current git branch is '{}', not '{}'", current, expected)
      }
      PreconditionError::UserAborted { version } => {
        write!(f, "Release aborted: version {} was not confirmed", version)
      }
      PreconditionError::DirtyTree { paths } => {
        let list: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        write!(f, "Uncommitted changes in: {}", list.join(", "))
      }
      PreconditionError::ToolMissing { tool } => write!(f, "Required tool not found: {}", tool),
    }
  }
}

/// Canonical record errors (the `ParseError` family)
#[derive(Debug)]
pub enum MetadataError {
  /// codemeta.json does not exist
  NotFound { path: PathBuf },

  /// codemeta.json is not valid JSON
  Malformed { path: PathBuf, reason: String },

  /// Required field missing or empty
  MissingField { path: PathBuf, field: String },
}

impl MetadataError {
  fn help_message(&self) -> Option<String> {
    match self {
      MetadataError::NotFound { .. } => Some("Run doi-release from the project root.".to_string()),
      MetadataError::MissingField { field, .. } => Some(format!("Add a non-empty \"{}\" to the record.", field)),
      MetadataError::Malformed { .. } => None,
    }
  }
}

impl fmt::Display for MetadataError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MetadataError::NotFound { path } => write!(f, "Metadata record not found: {}", path.display()),
      MetadataError::Malformed { path, reason } => {
        write!(f, "Failed to parse {}: {}", path.display(), reason)
      }
      MetadataError::MissingField { path, field } => {
        write!(f, "Missing required field \"{}\" in {}", field, path.display())
      }
    }
  }
}

/// External command failures
#[derive(Debug)]
pub enum ToolError {
  /// Command exited non-zero or could not be spawned
  CommandFailed { command: String, stderr: String },

  /// `git push` was rejected
  PushRejected { remote: String, reason: String },

  /// `gh release create` failed
  RemoteRelease { tag: String, reason: String },

  /// Editor exited non-zero
  Editor { editor: String, reason: String },
}

impl ToolError {
  fn help_message(&self) -> Option<String> {
    match self {
      ToolError::PushRejected { reason, .. } => {
        if reason.contains("non-fast-forward") || reason.contains("fetch first") {
          Some("The remote has commits you don't have. Pull and re-run; doi-release never force-pushes.".to_string())
        } else if reason.contains("Permission denied") || reason.contains("403") {
          Some("Check your SSH key or credential helper for the remote.".to_string())
        } else {
          None
        }
      }
      ToolError::RemoteRelease { tag, reason } => {
        if reason.contains("already exists") {
          Some(format!("A release for {} already exists. Bump the version and re-run.", tag))
        } else if reason.contains("auth") || reason.contains("401") {
          Some("Run `gh auth login` and re-run.".to_string())
        } else {
          Some("Re-run `doi-release release` once the problem is fixed; earlier steps are idempotent.".to_string())
        }
      }
      ToolError::Editor { .. } => Some("Set $EDITOR (or `editor` in release.toml) to a blocking editor.".to_string()),
      ToolError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for ToolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ToolError::CommandFailed { command, stderr } => {
        write!(f, "Command failed: {}\n{}", command, stderr)
      }
      ToolError::PushRejected { remote, reason } => write!(f, "Push to {} rejected: {}", remote, reason),
      ToolError::RemoteRelease { tag, reason } => {
        write!(f, "Failed to create GitHub release {}: {}", tag, reason)
      }
      ToolError::Editor { editor, reason } => write!(f, "Editor '{}' failed: {}", editor, reason),
    }
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Field has an unusable value
  InvalidField { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::InvalidField { field, .. } => Some(format!("Fix `{}` in release.toml or remove it to use the default.", field)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::InvalidField { field, reason } => {
        write!(f, "Invalid config value for `{}`: {}", field, reason)
      }
    }
  }
}

/// Result type alias for doi-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
