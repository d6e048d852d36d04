//! Core journal type definitions.
//!
//! Defines [`Modality`] (the entry input medium), [`JournalEntry`] (a full
//! record), and [`StreakState`] (per-user calendar-day streak state).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The input medium of a journal entry. Image and audio answers arrive as
/// text already extracted by the upload subsystem; the core never sees the
/// raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Image,
    Audio,
}

impl Modality {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }
}

impl Default for Modality {
    fn default() -> Self {
        Self::Text
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            _ => Err(format!("unknown modality: {s}")),
        }
    }
}

/// A journal entry, matching the `entries` table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    /// Opaque owner id, validated by the caller boundary.
    pub user_id: String,
    /// Short prompt the entry answers (≤255 chars).
    pub prompt: String,
    /// Long-form answer text (≤10 000 chars).
    pub answer: String,
    /// Input medium, assigned at construction, never probed at read time.
    pub modality: Modality,
    /// Optional free-form tag (≤150 chars).
    pub tag: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-modification timestamp.
    pub updated_at: String,
    /// Soft-delete marker. Non-`None` rows are invisible to every read.
    pub deleted_at: Option<String>,
}

/// Per-user streak state. `longest_streak` is the maximum `current_streak`
/// has ever reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakState {
    pub user_id: String,
    pub last_activity: Option<DateTime<Utc>>,
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl StreakState {
    /// Fresh state for a user with no activity yet.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            last_activity: None,
            current_streak: 0,
            longest_streak: 0,
        }
    }
}
