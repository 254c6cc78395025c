use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

use super::{BlobKey, BlobStore};

/// File extension for stored blobs.
const BLOB_EXTENSION: &str = "bin";

/// File-backed blob store: one file per key under a data directory.
///
/// Writes go to a uniquely named sibling temporary file that is synced to
/// disk and then renamed over the target, so a crash mid-write leaves the
/// previous blob intact.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    #[must_use]
    pub fn path_for(&self, key: BlobKey) -> PathBuf {
        self.dir.join(format!("{}.{BLOB_EXTENSION}", key.as_str()))
    }

    /// A fresh temporary path next to the file for `key`.
    ///
    /// Unique per call so overlapping writes of one key never share a file.
    fn temp_path_for(&self, key: BlobKey) -> PathBuf {
        self.dir.join(format!(
            ".{}.{BLOB_EXTENSION}.tmp.{}",
            key.as_str(),
            Uuid::now_v7()
        ))
    }

    fn unavailable(key: BlobKey, action: &str, err: &std::io::Error) -> Error {
        Error::storage_unavailable(key.as_str(), format!("{action}: {err}"))
    }
}

/// Write `bytes` to a new file at `path` and flush it to disk.
async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

#[async_trait::async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, key: BlobKey) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::unavailable(key, "read failed", &e)),
        }
    }

    async fn set(&self, key: BlobKey, bytes: Vec<u8>) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::unavailable(key, "create directory failed", &e))?;

        let path = self.path_for(key);
        let tmp = self.temp_path_for(key);
        let len = bytes.len();

        if let Err(e) = write_synced(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Self::unavailable(key, "write failed", &e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Self::unavailable(key, "rename failed", &e));
        }

        debug!("Wrote {} bytes to {}", len, path.display());
        Ok(())
    }

    async fn delete(&self, key: BlobKey) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::unavailable(key, "delete failed", &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        assert!(store.get(BlobKey::Database).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("nested/data"));

        store.set(BlobKey::Database, vec![7; 64]).await.unwrap();

        assert!(store.path_for(BlobKey::Database).exists());
        assert_eq!(
            store.get(BlobKey::Database).await.unwrap(),
            Some(vec![7; 64])
        );
    }

    #[tokio::test]
    async fn test_set_overwrites_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.set(BlobKey::Profile, b"first".to_vec()).await.unwrap();
        store.set(BlobKey::Profile, b"second".to_vec()).await.unwrap();

        assert_eq!(
            store.get(BlobKey::Profile).await.unwrap(),
            Some(b"second".to_vec())
        );
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["profile.bin"]);
    }

    #[tokio::test]
    async fn test_temp_paths_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        let first = store.temp_path_for(BlobKey::Database);
        let second = store.temp_path_for(BlobKey::Database);
        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(dir.path()));
        assert_ne!(first, store.path_for(BlobKey::Database));
    }

    #[tokio::test]
    async fn test_concurrent_sets_never_tear() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FsBlobStore::new(dir.path()));

        let writers: Vec<_> = (0u8..8)
            .map(|n| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move { store.set(BlobKey::Database, vec![n; 4096]).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let bytes = store.get(BlobKey::Database).await.unwrap().unwrap();
        assert_eq!(bytes.len(), 4096);
        assert!(bytes.iter().all(|b| *b == bytes[0]));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["database.bin"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.set(BlobKey::Database, vec![1]).await.unwrap();
        store.delete(BlobKey::Database).await.unwrap();
        assert!(store.get(BlobKey::Database).await.unwrap().is_none());

        // Deleting again is fine.
        store.delete(BlobKey::Database).await.unwrap();
    }

    #[tokio::test]
    async fn test_unwritable_dir_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = FsBlobStore::new(blocker.join("data"));
        let err = store.set(BlobKey::Database, vec![1]).await.unwrap_err();
        assert!(err.is_storage_unavailable());
    }

    #[test]
    fn test_path_for() {
        let store = FsBlobStore::new("/var/lib/platevote");
        assert_eq!(
            store.path_for(BlobKey::Database),
            PathBuf::from("/var/lib/platevote/database.bin")
        );
        assert_eq!(store.dir(), Path::new("/var/lib/platevote"));
    }
}
