//! Database image encoding.
//!
//! An image is the whole `SQLite` database serialized to bytes, wrapped in a
//! small envelope so truncated or foreign blobs are rejected before `SQLite`
//! ever sees them:
//!
//! ```text
//! MAGIC (8 bytes) | BLAKE3(payload) (32 bytes) | payload
//! ```

use rusqlite::{Connection, MAIN_DB};
use tracing::debug;

use crate::error::{Error, Result};

use super::schema;

/// Leading bytes of every image.
pub const MAGIC: &[u8; 8] = b"PLTVOTE1";

/// Length of the checksum that follows the magic.
const HASH_LEN: usize = 32;

/// Total envelope header length.
pub const HEADER_LEN: usize = MAGIC.len() + HASH_LEN;

/// Wrap a serialized database payload in the image envelope.
#[must_use]
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let hash = blake3::hash(payload);
    let mut image = Vec::with_capacity(HEADER_LEN + payload.len());
    image.extend_from_slice(MAGIC);
    image.extend_from_slice(hash.as_bytes());
    image.extend_from_slice(payload);
    image
}

/// Validate the envelope and return the payload it carries.
///
/// # Errors
///
/// Returns [`Error::CorruptImage`] if the image is too short, has the wrong
/// magic, or fails its checksum.
pub fn decode(image: &[u8]) -> Result<&[u8]> {
    if image.len() <= HEADER_LEN {
        return Err(Error::corrupt_image(format!(
            "image is {} bytes, shorter than its header",
            image.len()
        )));
    }

    let (magic, rest) = image.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(Error::corrupt_image("unrecognized image header"));
    }

    let (expected, payload) = rest.split_at(HASH_LEN);
    if blake3::hash(payload).as_bytes() != expected {
        return Err(Error::corrupt_image("checksum mismatch"));
    }

    Ok(payload)
}

/// Serialize the main database of `conn` into an image.
///
/// # Errors
///
/// Returns an error if `SQLite` cannot serialize the database.
pub fn capture(conn: &Connection) -> Result<Vec<u8>> {
    let data = conn.serialize(MAIN_DB)?;
    debug!("Serialized database payload of {} bytes", data.len());
    Ok(encode(&data))
}

/// Load an image into a fresh in-memory connection.
///
/// The restored database must carry the current schema version and both
/// ledger tables; anything else is treated as corrupt.
///
/// # Errors
///
/// Returns [`Error::CorruptImage`] if the envelope or the database inside it
/// cannot be read, or [`Error::DatabaseQuery`] if no connection can be opened.
pub fn restore(image: &[u8]) -> Result<Connection> {
    let payload = decode(image)?;

    let mut conn = Connection::open_in_memory()?;
    conn.deserialize_read_exact(MAIN_DB, payload, payload.len(), false)
        .map_err(|e| Error::corrupt_image(format!("sqlite rejected image: {e}")))?;

    let version = schema::version(&conn)
        .map_err(|e| Error::corrupt_image(format!("unreadable database: {e}")))?;
    if version != schema::SCHEMA_VERSION {
        return Err(Error::corrupt_image(format!(
            "schema version {version}, expected {}",
            schema::SCHEMA_VERSION
        )));
    }

    let present = schema::present_tables(&conn)
        .map_err(|e| Error::corrupt_image(format!("unreadable database: {e}")))?;
    if present != schema::REQUIRED_TABLES.len() {
        return Err(Error::corrupt_image("image is missing ledger tables"));
    }

    Ok(conn)
}
