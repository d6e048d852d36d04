//! Conversation turn codec.
//!
//! Turns persist as a single JSON blob in the `conversations.chat` column.
//! Encoding is a plain serialization of the ordered turn sequence; decoding
//! is tolerant by contract: `None`, empty, or corrupt blobs all come back as
//! an empty sequence so a damaged row can never fail a caller.

use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message in a conversation. A user turn's displayable content is its
/// *last* part; earlier parts are injected context, not user-authored text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<String>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![text.into()],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![text.into()],
        }
    }

    /// The text a reader should see for this turn.
    pub fn display_text(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }
}

/// Serialize a turn sequence to the storable blob.
pub fn encode(turns: &[Turn]) -> String {
    // Serialization of strings and enums cannot fail in practice; an empty
    // list blob keeps the decode contract intact if it ever does.
    serde_json::to_string(turns).unwrap_or_else(|_| "[]".to_string())
}

/// Deserialize a stored blob. Never errors: missing, empty, and malformed
/// input all decode to an empty sequence.
pub fn decode(blob: Option<&str>) -> Vec<Turn> {
    let Some(raw) = blob else {
        return Vec::new();
    };
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(turns) => turns,
        Err(err) => {
            tracing::warn!(error = %err, "corrupt conversation blob, treating as empty");
            Vec::new()
        }
    }
}
