//! Crate-wide error taxonomy.
//!
//! Callers map these onto their own surface (HTTP statuses, exit codes).
//! Transient AI failures and malformed AI responses never appear here — they
//! are absorbed inside [`crate::ai::client`] by retries and fallback content.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-range input. The message is safe to show to users.
    #[error("{0}")]
    Validation(String),

    /// A non-deleted entry already exists for this user on this UTC calendar day.
    #[error("an entry already exists for today")]
    DuplicateEntry,

    /// The resource does not exist or is not owned by the caller. The two
    /// cases are deliberately indistinguishable.
    #[error("not found or access denied")]
    NotFoundOrDenied,

    /// The AI provider reported quota/rate exhaustion. Never retried.
    #[error("AI service quota exceeded, try again later")]
    QuotaExceeded,

    /// Underlying store failure. The enclosing transaction is rolled back.
    #[error("database error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
