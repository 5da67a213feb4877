//! The release pipeline, one function per stage
//!
//! ```text
//! Start -> BranchCheck -> VersionConfirmation -> PropagateMetadata -> CommitIfChanged
//!       -> PushCommitsAndTags -> DraftReleaseNotes -> CreateRemoteRelease
//!       -> AwaitDownstreamWorkflow -> Done
//! ```
//!
//! Any stage error ends the run. Nothing already done is undone: pushed
//! commits stay pushed, rewritten files keep their `.bak` copies.

use crate::core::context::ReleaseContext;
use crate::core::error::{PreconditionError, ReleaseError, ReleaseResult, ResultExt};
use crate::metadata::ModifiedFile;
use crate::release::github::{GhCli, WorkflowRun};
use crate::release::notes;
use crate::release::tag::tag_for_version;
use crate::ui::prompt;
use std::fmt;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Start,
  BranchCheck,
  VersionConfirmation,
  PropagateMetadata,
  CommitIfChanged,
  PushCommitsAndTags,
  DraftReleaseNotes,
  CreateRemoteRelease,
  AwaitDownstreamWorkflow,
  Done,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Start => "start",
      Stage::BranchCheck => "branch check",
      Stage::VersionConfirmation => "version confirmation",
      Stage::PropagateMetadata => "propagate metadata",
      Stage::CommitIfChanged => "commit if changed",
      Stage::PushCommitsAndTags => "push commits and tags",
      Stage::DraftReleaseNotes => "draft release notes",
      Stage::CreateRemoteRelease => "create remote release",
      Stage::AwaitDownstreamWorkflow => "await downstream workflow",
      Stage::Done => "done",
    };
    write!(f, "{}", name)
  }
}

/// What a run produced, filled in as stages complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
  pub branch: String,
  pub tag: String,
  pub notes_file: Option<PathBuf>,
  pub run_id: Option<u64>,
}

impl ReleaseRecord {
  pub fn new(ctx: &ReleaseContext) -> Self {
    Self {
      branch: ctx.branch.clone(),
      tag: tag_for_version(&ctx.metadata.version),
      notes_file: None,
      run_id: None,
    }
  }
}

fn enter(stage: Stage) {
  log::info!("stage: {}", stage);
}

/// Halt unless the checked-out branch is the release branch
pub fn check_branch(ctx: &ReleaseContext) -> ReleaseResult<()> {
  enter(Stage::BranchCheck);
  if ctx.branch != ctx.config.release_branch {
    return Err(ReleaseError::Precondition(PreconditionError::WrongBranch {
      current: ctx.branch.clone(),
      expected: ctx.config.release_branch.clone(),
    }));
  }
  println!("✅ On branch {}", ctx.branch);
  Ok(())
}

/// Ask the operator to confirm the version recorded in codemeta.json
pub fn confirm_version<R: BufRead, W: Write>(ctx: &ReleaseContext, input: &mut R, output: &mut W) -> ReleaseResult<()> {
  enter(Stage::VersionConfirmation);
  let version = &ctx.metadata.version;

  writeln!(output, "📦 {} version {}", ctx.metadata.name, version).context("Failed to write prompt")?;
  if !ctx.metadata.has_semver_version() {
    log::warn!("version '{}' is not a semantic version", version);
    writeln!(output, "   ⚠️  '{}' is not a semantic version; tag will be {}", version, tag_for_version(version))
      .context("Failed to write prompt")?;
  }

  let question = format!("Have you updated the version number in {}?", ctx.config.files.codemeta.display());
  let confirmed = prompt::confirm(&question, input, output).context("Failed to read confirmation")?;
  if !confirmed {
    return Err(ReleaseError::Precondition(PreconditionError::UserAborted {
      version: version.clone(),
    }));
  }
  Ok(())
}

/// Rewrite the version-bump set from the canonical record
pub fn propagate_metadata(ctx: &ReleaseContext) -> ReleaseResult<Vec<ModifiedFile>> {
  enter(Stage::PropagateMetadata);
  println!("📝 Updating derived metadata files...");

  let modified = ctx.store().propagate(&ctx.metadata, &ctx.today)?;
  if modified.is_empty() {
    println!("   ℹ️  All derived files already up to date");
  }
  for file in &modified {
    println!("   ✏️  {} ({})", file.path.display(), file.kind);
  }
  Ok(modified)
}

/// Stage `paths` and commit them, unless staging left nothing to commit
///
/// Paths that do not exist are skipped. Returns the new commit SHA.
pub fn commit_if_changed(ctx: &ReleaseContext, paths: &[PathBuf], message: &str) -> ReleaseResult<Option<String>> {
  enter(Stage::CommitIfChanged);
  let present: Vec<PathBuf> = paths.iter().filter(|p| ctx.root.join(p).exists()).cloned().collect();
  if present.is_empty() {
    println!("   ℹ️  Nothing to commit");
    return Ok(None);
  }

  ctx.git.add(&present)?;
  if !ctx.git.has_staged_changes(&present)? {
    println!("   ℹ️  No changes to commit");
    return Ok(None);
  }

  let sha = ctx.git.commit_paths(message, &present)?;
  println!("   ✅ Committed {} ({})", message, short_sha(&sha));
  Ok(Some(sha))
}

/// Push every branch, then every tag
pub fn push_commits_and_tags(ctx: &ReleaseContext) -> ReleaseResult<()> {
  enter(Stage::PushCommitsAndTags);
  println!("📤 Pushing to {}...", ctx.config.remote);
  ctx.git.push_all(&ctx.config.remote)?;
  ctx.git.push_tags(&ctx.config.remote)?;
  Ok(())
}

/// `gh release create` for the record's tag
pub fn create_remote_release(ctx: &ReleaseContext, gh: &GhCli, record: &ReleaseRecord) -> ReleaseResult<()> {
  enter(Stage::CreateRemoteRelease);
  let notes_file = record
    .notes_file
    .as_deref()
    .ok_or_else(|| ReleaseError::message("Release notes were not drafted"))?;

  println!("🚀 Creating GitHub release {} on {}...", record.tag, record.branch);
  let title = format!("Release {}", ctx.metadata.version);
  gh.create_release(&record.tag, &record.branch, &title, notes_file)?;
  println!("   ✅ Created release {}", record.tag);
  Ok(())
}

/// Wait for the newest run of the archiving workflow to finish
///
/// Returns None when the workflow has no runs. A failed run is a warning,
/// not an error: the release itself already exists.
pub fn await_downstream_workflow(ctx: &ReleaseContext, gh: &GhCli) -> ReleaseResult<Option<WorkflowRun>> {
  enter(Stage::AwaitDownstreamWorkflow);
  let workflow = &ctx.config.workflow;
  let poll = Duration::from_secs(ctx.config.poll_interval_secs);

  println!("⏳ Waiting for workflow {} to start...", workflow);
  thread::sleep(Duration::from_secs(ctx.config.workflow_start_delay_secs));

  let Some(mut run) = gh.latest_run(workflow)? else {
    println!("   ⚠️  No runs found for {}", workflow);
    return Ok(None);
  };

  println!("   👀 Watching run {} {}", run.database_id, run.url);
  while !run.is_complete() {
    log::debug!("run {} status {}", run.database_id, run.status);
    thread::sleep(poll);
    run = gh.view_run(run.database_id)?;
  }

  if run.succeeded() {
    println!("   ✅ Workflow run {} succeeded", run.database_id);
  } else {
    log::warn!("workflow run {} concluded '{}'", run.database_id, run.conclusion);
    println!(
      "   ⚠️  Workflow run {} finished with '{}': {}",
      run.database_id, run.conclusion, run.url
    );
  }
  Ok(Some(run))
}

/// Run every stage in order
pub fn run_release(ctx: &ReleaseContext) -> ReleaseResult<ReleaseRecord> {
  enter(Stage::Start);
  let mut record = ReleaseRecord::new(ctx);

  check_branch(ctx)?;

  let stdin = std::io::stdin();
  let mut stdout = std::io::stdout();
  confirm_version(ctx, &mut stdin.lock(), &mut stdout)?;

  // gh is only needed after the push, but a missing tool should stop us before any mutation
  let gh = GhCli::new(&ctx.root)?;

  propagate_metadata(ctx)?;

  println!("📋 Committing version files...");
  let message = format!("chore: update stored version number to {}", ctx.metadata.version);
  commit_if_changed(ctx, &ctx.store().version_files(&ctx.metadata), &message)?;

  push_commits_and_tags(ctx)?;

  enter(Stage::DraftReleaseNotes);
  let notes = notes::draft_release_notes(&ctx.metadata.identifier, ctx.config.editor.as_deref())?;
  record.notes_file = Some(notes.path().to_path_buf());

  create_remote_release(ctx, &gh, &record)?;

  record.run_id = await_downstream_workflow(ctx, &gh)?.map(|run| run.database_id);

  enter(Stage::Done);
  println!();
  println!("🎉 Released {} {}", ctx.metadata.name, record.tag);
  println!();
  println!("Next steps:");
  println!("  1. doi-release post-release   (pull the new DOI into the metadata files)");
  println!("  2. doi-release packages       (build and check the distribution)");
  println!("  3. doi-release test-pypi      (upload to the test index)");
  println!("  4. doi-release pypi           (upload to the production index)");

  Ok(record)
}

fn short_sha(sha: &str) -> &str {
  &sha[..sha.len().min(8)]
}
