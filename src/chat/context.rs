//! Journal primer for new conversations.
//!
//! Converts a bounded window of recent entries into one AI-ready context
//! string. Dates are month-day only, and every prompt/answer goes through
//! [`crate::sanitize`] before leaving the trust boundary. The primer is
//! injected as an invisible first part of the first user turn of a new
//! conversation — never in later turns, never stored as a turn of its own.

use crate::journal::types::JournalEntry;
use crate::sanitize::sanitize;

pub const NO_RECENT_ACTIVITY: &str = "No recent journal activity to reference.";

const PROMPT_PREVIEW_CHARS: usize = 50;
const ANSWER_PREVIEW_CHARS: usize = 100;
const MAX_CONTEXT_LINES: usize = 5;

/// Build the initial-context primer from recent entries (newest first).
///
/// Entries whose sanitized prompt or answer comes out empty are dropped. At
/// most five lines are included. With zero qualifying entries the fixed
/// no-activity sentence is returned.
pub fn build_initial_context(entries: &[JournalEntry]) -> String {
    let lines: Vec<String> = entries
        .iter()
        .filter_map(|entry| {
            let date = crate::journal::parse_utc(&entry.created_at)
                .map(|d| d.format("%m-%d").to_string())
                .unwrap_or_else(|| "Recent".to_string());

            let prompt = sanitize(&entry.prompt, PROMPT_PREVIEW_CHARS);
            let answer = sanitize(&entry.answer, ANSWER_PREVIEW_CHARS);

            if prompt.is_empty() || answer.is_empty() {
                return None;
            }
            Some(format!(
                "- On {date}, topic: '{prompt}'. Response: '{answer}'"
            ))
        })
        .take(MAX_CONTEXT_LINES)
        .collect();

    if lines.is_empty() {
        return NO_RECENT_ACTIVITY.to_string();
    }

    format!(
        "Here's a brief overview of recent journal activity for context:\n{}\n\nNow, how can I help you today?",
        lines.join("\n")
    )
}
