//! File-backed remote storing the collection as a JSON array.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use flow_common::SyncSettings;
use flow_model::BookRecord;

use crate::error::{Result, SyncError};
use crate::remote::RemoteStore;

/// [`RemoteStore`] over a `data.json` file, e.g. inside a synced folder.
#[derive(Debug, Clone)]
pub struct JsonFileRemote {
    path: PathBuf,
}

impl JsonFileRemote {
    /// Remote at `dir/<sync.data_filename>`.
    pub fn new(dir: &Path, settings: &SyncSettings) -> Self {
        Self {
            path: dir.join(&settings.data_filename),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RemoteStore for JsonFileRemote {
    async fn fetch_collection(&self) -> Result<Vec<BookRecord>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_collection(&path))
            .await
            .map_err(|e| SyncError::Deserialization {
                source: Box::new(e),
            })?
    }

    async fn upload(&self, books: Vec<BookRecord>) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_collection(&books, &path))
            .await
            .map_err(|e| SyncError::Serialization {
                source: Box::new(e),
            })?
    }
}

/// Read the collection; a missing file is an empty collection.
fn read_collection(path: &Path) -> Result<Vec<BookRecord>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(SyncError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    serde_json::from_slice(&bytes).map_err(|e| SyncError::Deserialization {
        source: Box::new(e),
    })
}

/// Write the collection through a temp file and rename it into place.
fn write_collection(books: &[BookRecord], path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(books).map_err(|e| SyncError::Serialization {
        source: Box::new(e),
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(|e| SyncError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;
    file.write_all(&bytes).map_err(|e| SyncError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;
    file.sync_all().map_err(|e| SyncError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| SyncError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(count = books.len(), "wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_collection() {
        let dir = tempdir().unwrap();
        let books = read_collection(&dir.path().join("data.json")).unwrap();
        assert!(books.is_empty());
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        write_collection(&[BookRecord::new("a", "a.epub", 1)], &path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(read_collection(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            read_collection(&path),
            Err(SyncError::Deserialization { .. })
        ));
    }
}
