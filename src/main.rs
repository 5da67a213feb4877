mod archive;
mod commands;
mod core;
mod metadata;
mod package;
mod reconcile;
mod release;
mod ui;
mod utils;

use clap::{Parser, Subcommand};
use core::error::{ReleaseError, print_error};
use package::PackageIndex;

/// Cut releases of a Python project archived in an InvenioRDM repository
#[derive(Parser)]
#[command(name = "doi-release")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Releasing
  // ============================================================================
  /// Bump metadata, commit, push, create the GitHub release and wait for the archiving workflow
  Release,

  /// Rewrite the derived files from codemeta.json
  Update,

  /// Commit the version files if they changed
  CommitUpdates,

  // ============================================================================
  // Packaging
  // ============================================================================
  /// Clean, build and check the sdist and wheel
  Packages,

  /// Build, check and upload to the test package index
  TestPypi,

  /// Build, check and upload to PyPI
  Pypi,

  // ============================================================================
  // After the release
  // ============================================================================
  /// Write the archive's newest DOI into CITATION.cff, README.md and codemeta.json
  UpdateDoi,

  /// update-doi, then commit and push
  PostRelease,

  /// Show version, tag, repository and archive details
  Report {
    /// Output the report in JSON format
    #[arg(long)]
    json: bool,
  },
}

/// Get clap styling configuration
fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();

  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
    .format_timestamp(None)
    .init();

  // Build the release context once (config, codemeta.json, branch, remote)
  let project_root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(ReleaseError::from(e).context("Failed to get current directory")),
  };

  let ctx = match core::context::ReleaseContext::build(&project_root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Release => commands::run_release(&ctx),
    Commands::Update => commands::run_update(&ctx),
    Commands::CommitUpdates => commands::run_commit_updates(&ctx),
    Commands::Packages => commands::run_packages(&ctx),
    Commands::TestPypi => commands::run_upload(&ctx, PackageIndex::Test),
    Commands::Pypi => commands::run_upload(&ctx, PackageIndex::Production),
    Commands::UpdateDoi => commands::run_update_doi(&ctx),
    Commands::PostRelease => commands::run_post_release(&ctx),
    Commands::Report { json } => commands::run_report(&ctx, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
