//! Storage module for uploaded binary assets
//!
//! Local-filesystem blob store backing the `/uploads` static route.

mod uploads;

pub use uploads::{StagedUpload, StorageError, UploadStore, PUBLIC_PREFIX};
