//! `platevote` - A local ledger of up and down votes on license plates
//!
//! Votes are recorded in an in-memory `SQLite` store that is persisted as a
//! single hash-verified image after every change, so a device keeps its
//! plates, votes and leaderboards across restarts without a server.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod blob;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod persistence;
pub mod plate;
pub mod profile;
pub mod storage;

pub use blob::{BlobKey, BlobStore, FsBlobStore, MemoryBlobStore};
pub use capture::{CaptureSession, Frame, PlateReader};
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{Ledger, LifecycleEvent, Outcome};
pub use logging::init_logging;
pub use persistence::{Boot, BootSource, Persister};
pub use plate::{normalize, Direction, LeaderboardEntry, Plate, PlatePolicy, PlateText, Vote};
pub use profile::Profile;
pub use storage::{RowCounts, Store, StoreStats};
