//! Calendar-day streak state machine.
//!
//! Pure over [`StreakState`]; persistence and the independent
//! "entry already exists today" precondition live in [`crate::journal::entries`].

use chrono::{DateTime, Utc};

use crate::error::{CoreError, Result};
use crate::journal::types::StreakState;

/// Advance the streak for activity at `now`.
///
/// - first activity ever → streak becomes 1
/// - same UTC calendar day as the last activity → `DuplicateEntry`, no mutation
/// - exactly one day later → streak increments
/// - any larger gap (or a clock that moved backwards) → streak resets to 1
///
/// `longest_streak` tracks the maximum the current streak has reached.
pub fn record_activity(state: &StreakState, now: DateTime<Utc>) -> Result<StreakState> {
    let mut next = state.clone();

    match state.last_activity {
        None => {
            next.current_streak = 1;
        }
        Some(last) => {
            let days_diff = (now.date_naive() - last.date_naive()).num_days();
            if days_diff == 0 {
                return Err(CoreError::DuplicateEntry);
            } else if days_diff == 1 {
                next.current_streak += 1;
            } else {
                // Gap of more than a day, or negative (out-of-band mutation):
                // both start the count over.
                next.current_streak = 1;
            }
        }
    }

    next.longest_streak = next.longest_streak.max(next.current_streak);
    next.last_activity = Some(now);
    Ok(next)
}
