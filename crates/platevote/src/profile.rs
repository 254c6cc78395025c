//! Device-local user profile.
//!
//! A single display name stored as JSON under [`BlobKey::Profile`],
//! independent of the database image.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::blob::{BlobKey, BlobStore};
use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
struct ProfileRecord {
    display_name: String,
}

/// Accessor for the stored display name.
#[derive(Debug, Clone)]
pub struct Profile {
    blob: Arc<dyn BlobStore>,
}

impl Profile {
    /// Create an accessor over `blob`.
    #[must_use]
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self { blob }
    }

    /// The saved display name, if any.
    ///
    /// An unparseable record is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob store cannot be read.
    pub async fn load(&self) -> Result<Option<String>> {
        let Some(bytes) = self.blob.get(BlobKey::Profile).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<ProfileRecord>(&bytes) {
            Ok(record) => Ok(Some(record.display_name)),
            Err(e) => {
                warn!("Ignoring unreadable profile: {}", e);
                Ok(None)
            }
        }
    }

    /// Save a display name, returning it trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name is blank, or an error if
    /// the blob store cannot be written.
    pub async fn save(&self, display_name: &str) -> Result<String> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(Error::invalid_input("display name is empty"));
        }

        let record = ProfileRecord {
            display_name: display_name.to_string(),
        };
        self.blob
            .set(BlobKey::Profile, serde_json::to_vec(&record)?)
            .await?;
        debug!("Saved profile");
        Ok(record.display_name)
    }

    /// Remove the saved display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob store cannot be written.
    pub async fn clear(&self) -> Result<()> {
        self.blob.delete(BlobKey::Profile).await
    }
}
