use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::RwLock;

use crate::error::{Error, Result};

use super::{BlobKey, BlobStore};

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Writes can be switched off with
/// [`MemoryBlobStore::set_unavailable`] to exercise storage failures.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<BlobKey, Vec<u8>>>,
    unavailable: AtomicBool,
    reads_failing: AtomicBool,
    writes: AtomicU64,
}

impl MemoryBlobStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `bytes` under `key`.
    #[must_use]
    pub fn with_blob(key: BlobKey, bytes: Vec<u8>) -> Self {
        Self {
            blobs: RwLock::new(HashMap::from([(key, bytes)])),
            ..Self::default()
        }
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make only `get` fail, leaving writes working.
    pub fn set_reads_failing(&self, failing: bool) {
        self.reads_failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    fn check_available(&self, key: BlobKey) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::storage_unavailable(key.as_str(), "store marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: BlobKey) -> Result<Option<Vec<u8>>> {
        self.check_available(key)?;
        if self.reads_failing.load(Ordering::SeqCst) {
            return Err(Error::storage_unavailable(key.as_str(), "read failed"));
        }
        Ok(self.blobs.read().await.get(&key).cloned())
    }

    async fn set(&self, key: BlobKey, bytes: Vec<u8>) -> Result<()> {
        self.check_available(key)?;
        self.blobs.write().await.insert(key, bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: BlobKey) -> Result<()> {
        self.check_available(key)?;
        self.blobs.write().await.remove(&key);
        Ok(())
    }
}
