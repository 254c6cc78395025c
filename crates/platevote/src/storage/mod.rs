//! Storage layer for platevote.
//!
//! This module provides the in-memory `SQLite` store holding plates and
//! votes, the vote-recording transaction, the leaderboard queries, and
//! conversion to and from database images.

pub mod image;
pub mod schema;

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::plate::{LeaderboardEntry, Plate, PlateText, Vote};

/// Default number of rows returned by each leaderboard.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 50;

/// The relational store.
///
/// Holds an in-memory `SQLite` connection that exclusively owns every plate
/// and vote row. Durability is the caller's concern: take an image with
/// [`Store::to_image`] and hand it to a blob store.
#[derive(Debug)]
pub struct Store {
    /// Database connection.
    conn: Connection,
}

impl Store {
    /// Open a store, restoring from `image` if given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptImage`] if the image cannot be restored, or a
    /// database error if a fresh store cannot be initialized.
    pub fn open(image: Option<&[u8]>) -> Result<Self> {
        match image {
            Some(bytes) => Self::restore(bytes),
            None => Self::open_empty(),
        }
    }

    /// Create an empty store with a freshly initialized schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_empty() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::create(&conn)?;
        debug!("Initialized empty store");
        Ok(Self { conn })
    }

    /// Restore a store from a previously taken image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptImage`] if the image is not a valid image of
    /// the current schema.
    pub fn restore(image: &[u8]) -> Result<Self> {
        let conn = image::restore(image)?;
        info!("Restored store from {} byte image", image.len());
        Ok(Self { conn })
    }

    /// Serialize the entire store into an image.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` cannot serialize the database.
    pub fn to_image(&self) -> Result<Vec<u8>> {
        image::capture(&self.conn)
    }

    /// Record a vote against a plate.
    ///
    /// Normalizes the plate text, creates the plate row on first use, adds
    /// `delta` to its score and appends a vote row, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for empty plate text and
    /// [`Error::ConstraintViolation`] if `delta` is not +1 or -1. Neither
    /// leaves any row behind.
    pub fn record_vote(&mut self, raw_plate: &str, delta: i64) -> Result<Vote> {
        let plate = PlateText::parse(raw_plate)?;
        self.record_vote_for(&plate, delta)
    }

    /// Record a vote against an already normalized plate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConstraintViolation`] if `delta` is not +1 or -1.
    pub fn record_vote_for(&mut self, plate: &PlateText, delta: i64) -> Result<Vote> {
        let vote = Vote::new(plate, delta);
        let now = vote.created_at.to_rfc3339();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO plates (plate_text, score) VALUES (?1, 0) ON CONFLICT(plate_text) DO NOTHING",
            [plate.as_str()],
        )
        .map_err(Error::from_write)?;
        tx.execute(
            "UPDATE plates SET score = score + ?1, updated_at = ?2 WHERE plate_text = ?3",
            params![delta, now, plate.as_str()],
        )
        .map_err(Error::from_write)?;
        tx.execute(
            "INSERT INTO votes (id, plate_text, value, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![vote.id.to_string(), plate.as_str(), delta, now],
        )
        .map_err(Error::from_write)?;
        tx.commit()?;

        debug!("Recorded {:+} vote for {}", delta, plate);
        Ok(vote)
    }

    /// Plates with a positive score, highest first.
    ///
    /// Ties keep the order in which plates were first voted on.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn top_positive(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        self.leaderboard(
            r"
            SELECT plate_text, score FROM plates WHERE score > 0
            ORDER BY score DESC, rowid ASC LIMIT ?1
            ",
            limit,
        )
    }

    /// Plates with a negative score, most negative first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn top_negative(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        self.leaderboard(
            r"
            SELECT plate_text, score FROM plates WHERE score < 0
            ORDER BY score ASC, rowid ASC LIMIT ?1
            ",
            limit,
        )
    }

    fn leaderboard(&self, sql: &str, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut stmt = self.conn.prepare_cached(sql)?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map([limit_i64], |row| {
                Ok(LeaderboardEntry {
                    plate_text: row.get(0)?,
                    score: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Drop both tables and recreate the empty schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be rebuilt.
    pub fn reset(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        schema::drop_all(&tx)?;
        schema::create(&tx)?;
        tx.commit()?;

        // Cached statements refer to the dropped tables.
        self.conn.flush_prepared_statement_cache();
        warn!("Store reset; all plates and votes removed");
        Ok(())
    }

    /// Look up a plate by raw or normalized text.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn plate(&self, raw_plate: &str) -> Result<Option<Plate>> {
        let Ok(plate) = PlateText::parse(raw_plate) else {
            return Ok(None);
        };

        let result = self
            .conn
            .query_row(
                "SELECT plate_text, score, updated_at FROM plates WHERE plate_text = ?1",
                [plate.as_str()],
                Self::row_to_plate,
            )
            .optional()?;
        Ok(result)
    }

    /// All votes recorded against a plate, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn votes_for(&self, raw_plate: &str) -> Result<Vec<Vote>> {
        let Ok(plate) = PlateText::parse(raw_plate) else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare(
            r"
            SELECT id, plate_text, value, created_at
            FROM votes WHERE plate_text = ?1 ORDER BY created_at ASC, id ASC
            ",
        )?;

        let votes = stmt
            .query_map([plate.as_str()], Self::row_to_vote)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(votes)
    }

    /// Every plate row in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn plates(&self) -> Result<Vec<Plate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT plate_text, score, updated_at FROM plates ORDER BY rowid ASC")?;
        let plates = stmt
            .query_map([], Self::row_to_plate)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(plates)
    }

    /// Every vote row, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn votes(&self) -> Result<Vec<Vote>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, plate_text, value, created_at FROM votes ORDER BY id ASC")?;
        let votes = stmt
            .query_map([], Self::row_to_vote)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(votes)
    }

    /// Count plate and vote rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn counts(&self) -> Result<RowCounts> {
        let plates: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM plates", [], |row| row.get(0))?;
        let votes: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM votes", [], |row| row.get(0))?;
        Ok(RowCounts { plates, votes })
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let counts = self.counts()?;

        let last_vote: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM votes ORDER BY created_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let last_vote_at = last_vote.map(|s| parse_timestamp(0, &s)).transpose()?;

        let image_size_bytes = u64::try_from(self.to_image()?.len()).unwrap_or(u64::MAX);

        Ok(StoreStats {
            total_plates: counts.plates,
            total_votes: counts.votes,
            last_vote_at,
            image_size_bytes,
        })
    }

    /// Convert a database row to a Plate struct.
    fn row_to_plate(row: &rusqlite::Row) -> rusqlite::Result<Plate> {
        let updated_at: Option<String> = row.get(2)?;
        Ok(Plate {
            plate_text: row.get(0)?,
            score: row.get(1)?,
            updated_at: updated_at
                .map(|s| parse_timestamp(2, &s))
                .transpose()?,
        })
    }

    /// Convert a database row to a Vote struct.
    fn row_to_vote(row: &rusqlite::Row) -> rusqlite::Result<Vote> {
        let id: String = row.get(0)?;
        let created_at: String = row.get(3)?;

        Ok(Vote {
            id: Uuid::parse_str(&id).map_err(|e| conversion_failure(0, e))?,
            plate_text: row.get(1)?,
            value: row.get(2)?,
            created_at: parse_timestamp(3, &created_at)?,
        })
    }
}

/// Parse an RFC 3339 timestamp stored in column `idx`.
fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Row counts for both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowCounts {
    /// Rows in `plates`.
    pub plates: i64,
    /// Rows in `votes`.
    pub votes: i64,
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of plates.
    pub total_plates: i64,
    /// Total number of votes.
    pub total_votes: i64,
    /// Timestamp of the newest vote.
    pub last_vote_at: Option<DateTime<Utc>>,
    /// Size of the current image in bytes.
    pub image_size_bytes: u64,
}
