//! Snapshot persistence between the store and a blob store.
//!
//! Every persist re-serializes the whole store and overwrites the database
//! blob; there is no incremental state to keep in sync. A failed write is
//! reported to the caller and simply retried by the next persist.
//!
//! Images are numbered when they are taken and written one at a time. A
//! write whose image is older than the last one that reached the blob store
//! is skipped, so a slow background flush can never roll the saved state
//! back over a newer persist.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::blob::{BlobKey, BlobStore};
use crate::error::Result;
use crate::storage::Store;

/// Where a booted store's contents came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootSource {
    /// Restored from the saved image.
    Restored,
    /// No image was saved; started empty.
    Fresh,
    /// An image existed but could not be used; started empty.
    Recovered {
        /// Why the saved image was discarded.
        reason: String,
    },
}

/// A store produced by [`Persister::boot`].
#[derive(Debug)]
pub struct Boot {
    /// The ready-to-use store.
    pub store: Store,
    /// How it was obtained.
    pub source: BootSource,
}

/// Sequencing shared by every write issued through one persister.
#[derive(Debug, Default)]
struct WriteOrder {
    /// Last sequence number handed out.
    issued: AtomicU64,
    /// Sequence number of the newest image known to be in the blob store.
    durable: Mutex<u64>,
}

impl WriteOrder {
    fn next(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Write `image` unless a newer one already landed. Returns whether it was
/// written.
async fn write_in_order(
    blob: &dyn BlobStore,
    order: &WriteOrder,
    seq: u64,
    image: Vec<u8>,
) -> Result<bool> {
    let mut durable = order.durable.lock().await;
    if seq <= *durable {
        debug!("Skipping image #{} superseded by #{}", seq, *durable);
        return Ok(false);
    }
    blob.set(BlobKey::Database, image).await?;
    *durable = seq;
    Ok(true)
}

/// Bridge from a [`Store`] to the database key of a [`BlobStore`].
#[derive(Debug, Clone)]
pub struct Persister {
    blob: Arc<dyn BlobStore>,
    order: Arc<WriteOrder>,
}

impl Persister {
    /// Create a persister writing through `blob`.
    #[must_use]
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self {
            blob,
            order: Arc::new(WriteOrder::default()),
        }
    }

    /// The underlying blob store.
    #[must_use]
    pub fn blob(&self) -> &Arc<dyn BlobStore> {
        &self.blob
    }

    /// Load the saved image, or start empty.
    ///
    /// Boot never fails on a bad or unreachable image: the store starts
    /// empty and the reason is logged. A valid empty image is written back
    /// when nothing was saved or the saved image is corrupt. After a read
    /// failure nothing is written, since the saved image may still be good.
    ///
    /// # Errors
    ///
    /// Returns an error only if an empty in-memory store cannot be created.
    pub async fn boot(&self) -> Result<Boot> {
        let (store, source, write_back) = match self.blob.get(BlobKey::Database).await {
            Ok(Some(bytes)) => match Store::restore(&bytes) {
                Ok(store) => (store, BootSource::Restored, false),
                Err(e) => {
                    warn!("Discarding saved image: {}", e);
                    let reason = e.to_string();
                    (Store::open_empty()?, BootSource::Recovered { reason }, true)
                }
            },
            Ok(None) => {
                info!("No saved image; starting with an empty store");
                (Store::open_empty()?, BootSource::Fresh, true)
            }
            Err(e) => {
                warn!("Could not read saved image, starting empty: {}", e);
                let reason = e.to_string();
                (Store::open_empty()?, BootSource::Recovered { reason }, false)
            }
        };

        if write_back {
            if let Err(e) = self.persist(&store).await {
                warn!("Initial image write failed: {}", e);
            }
        }

        Ok(Boot { store, source })
    }

    /// Serialize `store` and overwrite the saved image.
    ///
    /// The image is taken before the returned future first polls, so the
    /// future does not borrow the store. If a newer image reaches the blob
    /// store first, this write is skipped and still reported as success.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StorageUnavailable`] if the write fails, or a
    /// database error if the store cannot be serialized. The store itself is
    /// untouched either way.
    pub fn persist(&self, store: &Store) -> impl Future<Output = Result<()>> + Send + '_ {
        let image = store.to_image();
        let seq = self.order.next();
        async move {
            let image = image?;
            let len = image.len();
            match write_in_order(self.blob.as_ref(), &self.order, seq, image).await {
                Ok(true) => {
                    debug!("Persisted image #{} ({} bytes)", seq, len);
                    Ok(())
                }
                Ok(false) => Ok(()),
                Err(e) => {
                    warn!("Persist failed, will retry on next mutation: {}", e);
                    Err(e)
                }
            }
        }
    }

    /// Start a best-effort persist without waiting for it.
    ///
    /// Used for visibility-loss style signals. The write may be lost if the
    /// process exits before it completes; failures are logged only. Returns
    /// `None` when no write was started (serialization failed, or there is no
    /// Tokio runtime to run it on).
    pub fn flush_in_background(&self, store: &Store) -> Option<JoinHandle<()>> {
        let image = match store.to_image() {
            Ok(image) => image,
            Err(e) => {
                warn!("Background flush skipped: {}", e);
                return None;
            }
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Background flush skipped: no async runtime");
            return None;
        };

        let seq = self.order.next();
        let blob = Arc::clone(&self.blob);
        let order = Arc::clone(&self.order);
        Some(runtime.spawn(async move {
            if let Err(e) = write_in_order(blob.as_ref(), &order, seq, image).await {
                warn!("Background flush failed: {}", e);
            }
        }))
    }
}
