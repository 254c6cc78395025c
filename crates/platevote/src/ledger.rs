//! The application-facing ledger.
//!
//! [`Ledger`] owns the store and the persister and is the only mutation
//! surface exposed to callers: every successful mutation is followed by a
//! full persist, and persist failures are reported alongside the result
//! rather than undoing the in-memory change.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::blob::BlobStore;
use crate::error::{Error, Result};
use crate::persistence::{BootSource, Persister};
use crate::plate::{LeaderboardEntry, PlatePolicy, Vote};
use crate::storage::Store;

/// Application lifecycle signals the ledger reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The application lost visibility (backgrounded, window hidden).
    VisibilityHidden,
    /// The application is about to exit.
    Shutdown,
}

/// The result of a mutation together with how its persist went.
#[derive(Debug)]
pub struct Outcome<T> {
    /// What the mutation produced.
    pub value: T,
    /// Set when the follow-up persist failed. The mutation still stands in
    /// memory and the next persist retries the full write.
    pub persist_error: Option<Error>,
}

impl<T> Outcome<T> {
    /// Whether the mutation reached the blob store.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }

    /// Discard persistence information.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// The voting ledger.
#[derive(Debug)]
pub struct Ledger {
    store: Store,
    persister: Persister,
    policy: PlatePolicy,
    boot_source: BootSource,
}

impl Ledger {
    /// Boot a ledger from `blob`.
    ///
    /// # Errors
    ///
    /// Returns an error only if an empty store cannot be created; see
    /// [`Persister::boot`].
    pub async fn open(blob: Arc<dyn BlobStore>) -> Result<Self> {
        let persister = Persister::new(blob);
        let boot = persister.boot().await?;
        info!("Ledger ready ({:?})", boot.source);
        Ok(Self {
            store: boot.store,
            persister,
            policy: PlatePolicy::default(),
            boot_source: boot.source,
        })
    }

    /// Wrap an existing store and persister. `boot_source` records where
    /// the store's contents came from.
    #[must_use]
    pub fn new(store: Store, persister: Persister, boot_source: BootSource) -> Self {
        Self {
            store,
            persister,
            policy: PlatePolicy::default(),
            boot_source,
        }
    }

    /// Replace the plate acceptance policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PlatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// How the store was obtained at boot.
    #[must_use]
    pub fn boot_source(&self) -> &BootSource {
        &self.boot_source
    }

    /// Read-only access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Record a vote and persist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] or [`Error::ConstraintViolation`] if
    /// the vote is rejected; nothing is written or persisted in that case.
    /// A persist failure is not an error here; see [`Outcome::persist_error`].
    pub async fn record_vote(&mut self, raw_plate: &str, delta: i64) -> Result<Outcome<Vote>> {
        let plate = self.policy.parse(raw_plate)?;
        let vote = self.store.record_vote_for(&plate, delta)?;
        let persist_error = self.persister.persist(&self.store).await.err();
        Ok(Outcome {
            value: vote,
            persist_error,
        })
    }

    /// Plates with a positive score, highest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn top_positive(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        self.store.top_positive(limit)
    }

    /// Plates with a negative score, most negative first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn top_negative(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        self.store.top_negative(limit)
    }

    /// Both leaderboards, positive first, each at most `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns an error if either query fails.
    pub fn leaderboards(
        &self,
        limit: usize,
    ) -> Result<(Vec<LeaderboardEntry>, Vec<LeaderboardEntry>)> {
        Ok((self.top_positive(limit)?, self.top_negative(limit)?))
    }

    /// Drop all plates and votes, then persist the empty store.
    ///
    /// Irreversible. Confirmation is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be rebuilt. A persist failure is
    /// reported through [`Outcome::persist_error`].
    pub async fn reset(&mut self) -> Result<Outcome<()>> {
        self.store.reset()?;
        let persist_error = self.persister.persist(&self.store).await.err();
        Ok(Outcome {
            value: (),
            persist_error,
        })
    }

    /// Persist the current state now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the write fails.
    pub async fn persist(&self) -> Result<()> {
        self.persister.persist(&self.store).await
    }

    /// Best-effort flush when the application is hidden. Does not wait.
    pub fn on_visibility_hidden(&self) -> Option<JoinHandle<()>> {
        self.persister.flush_in_background(&self.store)
    }

    /// Final persist before exit. Failures are logged, not returned.
    pub async fn shutdown(&self) {
        if let Err(e) = self.persist().await {
            warn!("Final persist on shutdown failed: {}", e);
        }
    }

    /// Dispatch a lifecycle event.
    pub async fn handle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::VisibilityHidden => {
                // Detached; completion is not awaited.
                drop(self.on_visibility_hidden());
            }
            LifecycleEvent::Shutdown => self.shutdown().await,
        }
    }
}
