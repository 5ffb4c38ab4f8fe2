//! Journal entry domain model.
//!
//! This module contains the core JournalEntry entity, the validated
//! MoodScore newtype, and the EntryDraft payload used for create/update
//! operations against the remote store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{KokoroError, Result};

/// Display emoji for each mood score, index 0 = score 1.
pub const MOOD_EMOJIS: [&str; 10] = ["😢", "😞", "😔", "😐", "🙂", "😊", "😄", "😁", "🤩", "🥳"];

/// A self-rated mood score, always within 1..=10.
///
/// The range is enforced at construction, so a `MoodScore` in hand is
/// always valid; deserialization goes through the same check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MoodScore(u8);

impl MoodScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Creates a mood score, rejecting values outside 1..=10.
    pub fn new(value: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(KokoroError::validation(format!(
                "mood score must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// The display emoji for this score.
    pub fn emoji(&self) -> &'static str {
        MOOD_EMOJIS[(self.0 - 1) as usize]
    }
}

impl TryFrom<u8> for MoodScore {
    type Error = KokoroError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<i64> for MoodScore {
    type Error = KokoroError;

    fn try_from(value: i64) -> Result<Self> {
        let value: u8 = value.try_into().map_err(|_| {
            KokoroError::validation(format!("mood score must be between 1 and 10, got {}", value))
        })?;
        Self::new(value)
    }
}

impl From<MoodScore> for u8 {
    fn from(score: MoodScore) -> u8 {
        score.0
    }
}

impl std::fmt::Display for MoodScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user's journal record for a single calendar date.
///
/// The backend enforces uniqueness of (user, date); the client never holds
/// more than one entry in focus at a time. Dates are timezone-less calendar
/// days and are never UTC-shifted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique entry identifier
    pub id: Uuid,
    /// Owning user identifier
    pub user_id: Uuid,
    /// The calendar day this entry belongs to (unique per user)
    pub date: NaiveDate,
    /// Diary text
    pub content: String,
    /// Self-rated mood, 1..=10
    pub mood_score: MoodScore,
    /// Optional attached image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Timestamp when the entry was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the entry was last updated
    pub updated_at: DateTime<Utc>,
}

/// The client-side payload for creating or fully replacing an entry.
///
/// Serializes to the request body the backend expects:
/// `{content, mood_score, date, image_url}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub content: String,
    pub mood_score: MoodScore,
    pub image_url: Option<String>,
}

impl EntryDraft {
    /// Builds a draft with trimmed content.
    pub fn new(
        date: NaiveDate,
        content: impl Into<String>,
        mood_score: MoodScore,
        image_url: Option<String>,
    ) -> Self {
        Self {
            date,
            content: content.into().trim().to_string(),
            mood_score,
            image_url,
        }
    }

    /// Validates the draft before any network call is issued.
    ///
    /// The mood score range is already guaranteed by its type; the remaining
    /// precondition is non-empty content.
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(KokoroError::validation("content must not be empty"));
        }
        Ok(())
    }
}
