//! Flat on-disk store for uploaded audio and thumbnail files.
//!
//! Files live directly under a single root directory and are addressed by
//! generated names. Records refer to them by relative URL
//! (`/uploads/<filename>`). Every path derived from a URL is passed through
//! [`safe_basename`] and must resolve to a direct child of the root.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::sanitize::safe_basename;

/// URL prefix under which stored files are served.
pub const DEFAULT_URL_PREFIX: &str = "/uploads";

/// Longest file extension carried over from the client-supplied name.
const MAX_EXTENSION_LEN: usize = 8;

/// A file written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Generated on-disk filename.
    pub filename: String,
    /// Relative URL persisted on the record.
    pub url: String,
}

/// Result of a best-effort deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The file existed and was removed.
    Deleted,
    /// No file with that name exists; nothing to do.
    Missing,
    /// The URL did not reduce to a safe name inside the store. Nothing was
    /// touched, so the referenced file (if any) may now be orphaned.
    Rejected,
}

/// Local asset directory.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    url_prefix: String,
}

impl AssetStore {
    /// Create a store rooted at `root`, served under [`DEFAULT_URL_PREFIX`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Relative URL for a stored filename.
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{filename}", self.url_prefix)
    }

    /// Generate a collision-resistant filename, keeping a short alphanumeric
    /// extension from `original_name` when there is one.
    ///
    /// Format: `<unix-millis>-<uuid-v4-simple>[.ext]`.
    pub fn generate_filename(original_name: Option<&str>) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let id = uuid::Uuid::new_v4().simple();
        match original_name.and_then(extension_of) {
            Some(ext) => format!("{millis}-{id}.{ext}"),
            None => format!("{millis}-{id}"),
        }
    }

    /// Write `bytes` under a freshly generated name.
    ///
    /// Creates the root directory if needed. Never overwrites an existing
    /// file.
    pub async fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> io::Result<StoredAsset> {
        tokio::fs::create_dir_all(&self.root).await?;

        let filename = Self::generate_filename(original_name);
        let path = self.root.join(&filename);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(StoredAsset {
            url: self.url_for(&filename),
            filename,
        })
    }

    /// Resolve a stored URL (or bare filename) to a path strictly inside the
    /// root. Returns `None` if the name is unsafe.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let name = safe_basename(url)?;
        let path = self.root.join(&name);
        (path.parent() == Some(self.root.as_path())).then_some(path)
    }

    #[cfg(test)]
    async fn exists(&self, url: &str) -> bool {
        match self.resolve(url) {
            Some(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Delete the file referenced by `url`.
    ///
    /// Missing files are not an error. Unsafe names are never touched and
    /// report [`DeleteOutcome::Rejected`]. Other I/O failures are returned.
    pub async fn delete_url(&self, url: &str) -> io::Result<DeleteOutcome> {
        let Some(path) = self.resolve(url) else {
            return Ok(DeleteOutcome::Rejected);
        };

        if !tokio::fs::try_exists(&path).await? {
            return Ok(DeleteOutcome::Missing);
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            // Raced with another delete.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DeleteOutcome::Missing),
            Err(e) => Err(e),
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}
