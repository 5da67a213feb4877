//! Project metadata: the canonical codemeta.json record and the files derived from it
//!
//! - **record**: `ProjectMetadata` loading and required-field checks
//! - **derived**: typed descriptors for the anchored regions of each derived file
//! - **store**: reads the record, applies descriptors to files on disk with backups

pub mod derived;
pub mod record;
pub mod store;

pub use derived::{DerivedFile, DerivedFileDescriptor, FieldValues, field};
pub use record::ProjectMetadata;
pub use store::{MetadataStore, ModifiedFile};
