//! Core plate and vote types for platevote.
//!
//! This module defines the data structures stored in the ledger and the
//! normalization applied to every plate string before lookup or write.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Normalize raw plate text.
///
/// Removes all whitespace and upper-cases the remainder, so `" abc 123 "`
/// and `"ABC123"` name the same plate. Idempotent.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A normalized, non-empty plate identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlateText(String);

impl PlateText {
    /// Normalize `raw` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if nothing is left after normalization.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(Error::invalid_input("plate text is empty"));
        }
        Ok(Self(normalized))
    }

    /// The normalized text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the normalized text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PlateText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PlateText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extra acceptance rules applied to normalized plates.
///
/// The default policy accepts any non-empty plate.
#[derive(Debug, Clone, Default)]
pub struct PlatePolicy {
    pattern: Option<Regex>,
}

impl PlatePolicy {
    /// Build a policy requiring normalized plates to match `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the pattern does not compile.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::ConfigValidation {
            message: format!("invalid plate pattern {pattern}: {e}"),
        })?;
        Ok(Self {
            pattern: Some(regex),
        })
    }

    /// Normalize `raw` and check it against this policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the plate is empty or does not
    /// match the pattern.
    pub fn parse(&self, raw: &str) -> Result<PlateText> {
        let plate = PlateText::parse(raw)?;
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(plate.as_str()) {
                return Err(Error::invalid_input(format!(
                    "plate {plate} does not match {}",
                    pattern.as_str()
                )));
            }
        }
        Ok(plate)
    }
}

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// A +1 vote.
    Up,
    /// A -1 vote.
    Down,
}

impl Direction {
    /// The signed delta this direction applies to a score.
    #[must_use]
    pub fn delta(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(Error::constraint_violation(format!(
                "vote value must be +1 or -1, got {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// A plate row: the normalized identifier and its running score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plate {
    /// Normalized plate identifier.
    pub plate_text: String,
    /// Sum of every vote recorded against this plate.
    pub score: i64,
    /// When the score last changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One immutable vote event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Globally unique identifier.
    pub id: Uuid,
    /// The plate this vote was cast against.
    pub plate_text: String,
    /// Either +1 or -1.
    pub value: i64,
    /// When the vote was recorded.
    pub created_at: DateTime<Utc>,
}

impl Vote {
    /// Create a vote stamped with a fresh time-ordered id and the current time.
    #[must_use]
    pub fn new(plate: &PlateText, value: i64) -> Self {
        Self {
            id: Uuid::now_v7(),
            plate_text: plate.as_str().to_string(),
            value,
            created_at: Utc::now(),
        }
    }

    /// The direction of this vote, if its value is well formed.
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        Direction::try_from(self.value).ok()
    }
}

/// A single leaderboard line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Normalized plate identifier.
    pub plate_text: String,
    /// Current score.
    pub score: i64,
}

impl LeaderboardEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(plate_text: impl Into<String>, score: i64) -> Self {
        Self {
            plate_text: plate_text.into(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_uppercases() {
        assert_eq!(normalize(" abc123 "), "ABC123");
        assert_eq!(normalize("ABC123"), "ABC123");
        assert_eq!(normalize("abc 123"), "ABC123");
        assert_eq!(normalize("\tx y\nz "), "XYZ");
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in ["", "  ", " abc 123 ", "Ab-9 z", "ÿ straße", "ABC123"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_plate_text_parse() {
        let plate = PlateText::parse(" abc 123 ").unwrap();
        assert_eq!(plate.as_str(), "ABC123");
        assert_eq!(plate.to_string(), "ABC123");
        assert_eq!(plate, PlateText::parse("ABC123").unwrap());
    }

    #[test]
    fn test_plate_text_parse_empty() {
        assert!(PlateText::parse("").unwrap_err().is_invalid_input());
        assert!(PlateText::parse("   \t\n").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_default_policy_accepts_any_plate() {
        let policy = PlatePolicy::default();
        assert_eq!(policy.parse("ÄÖ 1").unwrap().as_str(), "ÄÖ1");
        assert!(policy.parse(" ").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_pattern_policy() {
        let policy = PlatePolicy::with_pattern("^[A-Z0-9]{2,8}$").unwrap();
        assert_eq!(policy.parse("abc 123").unwrap().as_str(), "ABC123");

        let err = policy.parse("abc-123").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(policy.parse("A").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_pattern_policy_bad_regex() {
        let err = PlatePolicy::with_pattern("[unclosed").unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Up.delta(), 1);
        assert_eq!(Direction::Down.delta(), -1);
    }

    #[test]
    fn test_direction_try_from() {
        assert_eq!(Direction::try_from(1).unwrap(), Direction::Up);
        assert_eq!(Direction::try_from(-1).unwrap(), Direction::Down);
        assert!(Direction::try_from(0).unwrap_err().is_constraint_violation());
        assert!(Direction::try_from(2).unwrap_err().is_constraint_violation());
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn test_vote_new_unique_ids() {
        let plate = PlateText::parse("abc123").unwrap();
        let a = Vote::new(&plate, 1);
        let b = Vote::new(&plate, 1);

        assert_ne!(a.id, b.id);
        assert_eq!(a.plate_text, "ABC123");
        assert_eq!(a.direction(), Some(Direction::Up));
    }

    #[test]
    fn test_leaderboard_entry_serialization() {
        let entry = LeaderboardEntry::new("ABC123", 2);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"plate_text":"ABC123","score":2}"#);
    }
}
