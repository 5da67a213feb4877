//! CLI commands for doi-release
//!
//! ## Releasing
//! - **release**: the full pipeline (branch check through workflow wait)
//! - **update**: rewrite the derived files from codemeta.json
//! - **commit-updates**: commit the version files if they changed
//!
//! ## Packaging
//! - **packages**: clean, build and `twine check`
//! - **test-pypi** / **pypi**: the same, then upload
//!
//! ## After the release
//! - **update-doi**: pull the archive's newest DOI into the metadata files
//! - **post-release**: update-doi, commit, push
//! - **report**: show what a release would use
//!
//! All commands accept `&ReleaseContext`, built once in main.

pub mod doi;
pub mod packages;
pub mod release;
pub mod report;

pub use doi::{run_post_release, run_update_doi};
pub use packages::{run_packages, run_upload};
pub use release::{run_commit_updates, run_release, run_update};
pub use report::run_report;
