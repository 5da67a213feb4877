//! Release sequencing: from a confirmed version to a published GitHub release
//!
//! # Invariants
//!
//! 1. **Fail fast, never roll back**
//!    - The first failing stage ends the run
//!    - Work already done (rewritten files, pushed commits) is left in place
//!
//! 2. **Gates before mutation**
//!    - Branch check and version confirmation run before any file is touched
//!
//! 3. **No empty commits**
//!    - The version-bump commit is made only when staging produced a diff
//!
//! # Layout
//!
//! - **sequencer**: the ordered stages and `run_release`
//! - **tag**: version string to tag name
//! - **notes**: release notes drafted in `$EDITOR`
//! - **github**: `gh release create` and workflow-run polling

pub mod github;
pub mod notes;
pub mod sequencer;
pub mod tag;

pub use tag::tag_for_version;
