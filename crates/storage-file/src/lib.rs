//! File-backed [`BlobStore`].
//!
//! One file per key inside a data directory, with a `.json` suffix since
//! every stored blob is serialized JSON. Writes go through a sibling temp
//! file and an atomic rename so a crash mid-write never leaves a truncated
//! cache behind.

use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::fs;

use kover_core::errors::{Error, Result};
use kover_core::prices::BlobStore;

/// Blob store that keeps each key in its own file under a data directory.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Storage(format!("cannot create data dir {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

/// Keys become file names, so restrict them to a safe charset.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(Error::Storage(format!("invalid blob key '{key}'")))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| Error::Storage(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::Storage(format!("cannot replace {}: {e}", path.display())))?;
        debug!("[storage] wrote {} bytes to {key}", bytes.len());
        Ok(())
    }

    async fn remove_blob(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "cannot remove {}: {e}",
                path.display()
            ))),
        }
    }
}
