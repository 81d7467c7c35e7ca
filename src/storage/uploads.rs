//! Filesystem blob store for uploaded model and thumbnail files
//!
//! Uploads are buffered first (`StagedUpload`) and only written to disk on
//! `commit`, after the request's metadata has passed validation. Stored files
//! are addressed by public `/uploads/<name>` paths that the static file route
//! serves directly.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

/// Public URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Errors that can occur in the upload store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid upload path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// An upload that has been fully received but not yet written to disk.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    /// Original client-side filename; only its extension is kept.
    pub filename: String,
    pub data: Bytes,
}

/// Handle to the upload directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Open the store, creating the upload directory (and parents) if absent.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(UploadStore { root })
    }

    /// Directory files are stored in, for the static file route.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a staged upload to disk under a collision-resistant generated
    /// name and return its public `/uploads/<name>` path.
    pub async fn commit(&self, staged: &StagedUpload) -> Result<String, StorageError> {
        let name = generate_name(&staged.filename);
        let target = self.root.join(&name);

        tokio::fs::write(&target, &staged.data).await?;

        info!(
            file = %name,
            bytes = staged.data.len(),
            "Stored uploaded file"
        );

        Ok(format!("{}{}", PUBLIC_PREFIX, name))
    }

    /// Remove a stored file by its public path. Missing files are not an
    /// error; delete is idempotent.
    pub async fn delete(&self, public_path: &str) -> Result<(), StorageError> {
        let name = public_path.strip_prefix(PUBLIC_PREFIX).ok_or_else(|| {
            StorageError::InvalidPath(format!("'{}' is not an upload path", public_path))
        })?;

        // Stored names are flat; anything that could escape the root is bogus.
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(StorageError::InvalidPath(format!(
                "'{}' is not a stored file name",
                name
            )));
        }

        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => {
                debug!(file = %name, "Deleted uploaded file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Generate `<unix-millis>-<random>` plus the original extension. The random
/// suffix makes concurrent same-millisecond uploads collision-resistant
/// without any shared counter.
fn generate_name(original: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}{}", timestamp, suffix, extension_of(original))
}

fn extension_of(original: &str) -> String {
    Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}
