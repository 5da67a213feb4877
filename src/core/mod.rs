//! Core engine for doi-release
//!
//! - **config**: release.toml parsing and validation
//! - **context**: immutable run context shared by every stage
//! - **error**: error taxonomy with contextual help and exit codes
//! - **exec**: subprocess helpers for gh, python and the editor
//! - **vcs**: git operations (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod vcs;
