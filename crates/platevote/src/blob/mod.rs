//! Durable key-value byte storage.
//!
//! The ledger keeps exactly two blobs: the database image and the user
//! profile. Implementations provide async get/set/delete with no
//! transactions across keys.

mod fs;
mod memory;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

use crate::error::Result;

/// The keys a blob store is addressed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKey {
    /// The serialized database image.
    Database,
    /// The user's display-name profile.
    Profile,
}

impl BlobKey {
    /// Every key, in a stable order.
    pub const ALL: [Self; 2] = [Self::Database, Self::Profile];

    /// Stable name used for files and log lines.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Profile => "profile",
        }
    }
}

impl std::fmt::Display for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trait for durable byte storage backends.
///
/// All failures are reported as [`crate::Error::StorageUnavailable`]. A
/// `set` either replaces the whole value or fails; readers never observe a
/// partially written blob.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Read the bytes stored under `key`, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get(&self, key: BlobKey) -> Result<Option<Vec<u8>>>;

    /// Replace the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn set(&self, key: BlobKey, bytes: Vec<u8>) -> Result<()>;

    /// Remove whatever is stored under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn delete(&self, key: BlobKey) -> Result<()>;
}
