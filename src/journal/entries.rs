//! Entry store — validation, atomic create with streak advance, reads, soft
//! delete.
//!
//! [`create_entry`] is the write path that couples two mutations: the new
//! entry row and the user's streak row. Both are committed inside one
//! transaction so a streak can never advance without a corresponding entry.
//! All reads exclude soft-deleted rows and scope by owner.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::journal::streak;
use crate::journal::types::{JournalEntry, Modality, StreakState};

/// Hard cap on answer length; overlong answers are truncated with a warning
/// rather than rejected.
pub const MAX_ANSWER_CHARS: usize = 10_000;
pub const MAX_PROMPT_CHARS: usize = 255;
pub const MAX_TAG_CHARS: usize = 150;

/// Input for a new entry. `answer` is the final text: for image/audio
/// modalities the upload subsystem has already extracted it.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub prompt: String,
    pub answer: String,
    pub modality: Modality,
    pub tag: Option<String>,
}

/// Result of a successful create: the stored entry plus the streak state it
/// advanced.
#[derive(Debug, Serialize)]
pub struct CreatedEntry {
    pub entry: JournalEntry,
    pub streak: StreakState,
}

/// Field-wise update. `tag: Some("")` clears the tag; `None` leaves it alone.
#[derive(Debug, Default, Clone)]
pub struct EntryPatch {
    pub prompt: Option<String>,
    pub answer: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedEntry {
    pub entry: JournalEntry,
    pub updated_fields: Vec<&'static str>,
}

/// A page of entries, newest first.
#[derive(Debug, Serialize)]
pub struct EntryPage {
    pub items: Vec<JournalEntry>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

/// Trim and length-check a required text field.
fn clean_required(text: &str, max_chars: usize, field: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!(
            "{field} is required and cannot be empty"
        )));
    }
    if trimmed.chars().count() > max_chars {
        return Err(CoreError::validation(format!(
            "{field} too long (maximum {max_chars} characters)"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; empty becomes `None`.
fn clean_optional(text: Option<&str>, max_chars: usize, field: &str) -> Result<Option<String>> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(t) if t.chars().count() > max_chars => Err(CoreError::validation(format!(
            "{field} too long (maximum {max_chars} characters)"
        ))),
        Some(t) => Ok(Some(t.to_string())),
    }
}

/// Create an entry and advance the streak, atomically.
///
/// Validation runs before any state is touched. The duplicate-day rule is
/// enforced twice: by counting today's non-deleted entries (the stricter
/// check, immune to out-of-band `last_activity` mutation) and by the streak
/// state machine itself.
pub fn create_entry(
    conn: &mut Connection,
    user_id: &str,
    input: NewEntry,
    now: DateTime<Utc>,
) -> Result<CreatedEntry> {
    let prompt = clean_required(&input.prompt, MAX_PROMPT_CHARS, "prompt")?;
    let tag = clean_optional(input.tag.as_deref(), MAX_TAG_CHARS, "tag")?;

    let answer = input.answer.trim();
    if answer.is_empty() {
        return Err(CoreError::validation("answer is required and cannot be empty"));
    }
    let answer = if answer.chars().count() > MAX_ANSWER_CHARS {
        tracing::warn!(user = %user_id, "answer truncated to {MAX_ANSWER_CHARS} characters");
        answer.chars().take(MAX_ANSWER_CHARS).collect()
    } else {
        answer.to_string()
    };

    let tx = conn.transaction()?;

    if count_today(&tx, user_id, now)? > 0 {
        return Err(CoreError::DuplicateEntry);
    }

    let state = load_streak(&tx, user_id)?;
    let advanced = streak::record_activity(&state, now)?;

    let id = uuid::Uuid::now_v7().to_string();
    let ts = now.to_rfc3339();
    tx.execute(
        "INSERT INTO entries (id, user_id, prompt, answer, modality, tag, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![id, user_id, prompt, answer, input.modality.as_str(), tag, ts],
    )?;
    save_streak(&tx, &advanced)?;

    tx.commit()?;

    tracing::info!(entry = %id, user = %user_id, streak = advanced.current_streak, "entry created");

    Ok(CreatedEntry {
        entry: JournalEntry {
            id,
            user_id: user_id.to_string(),
            prompt,
            answer,
            modality: input.modality,
            tag,
            created_at: ts.clone(),
            updated_at: ts,
            deleted_at: None,
        },
        streak: advanced,
    })
}

/// Count non-deleted entries the user created today (UTC calendar day).
fn count_today(tx: &Transaction, user_id: &str, now: DateTime<Utc>) -> Result<u32> {
    let day_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc()
        .to_rfc3339();
    let count = tx.query_row(
        "SELECT COUNT(*) FROM entries \
         WHERE user_id = ?1 AND created_at >= ?2 AND deleted_at IS NULL",
        params![user_id, day_start],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Load the user's streak row, or fresh zeroed state if none exists yet.
fn load_streak(tx: &Transaction, user_id: &str) -> Result<StreakState> {
    let row = tx
        .query_row(
            "SELECT last_activity, current_streak, longest_streak FROM streaks WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            },
        )
        .optional()?;

    Ok(match row {
        Some((last, current, longest)) => StreakState {
            user_id: user_id.to_string(),
            last_activity: last.as_deref().and_then(super::parse_utc),
            current_streak: current,
            longest_streak: longest,
        },
        None => StreakState::new(user_id),
    })
}

fn save_streak(tx: &Transaction, state: &StreakState) -> Result<()> {
    tx.execute(
        "INSERT INTO streaks (user_id, last_activity, current_streak, longest_streak) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(user_id) DO UPDATE SET \
           last_activity = excluded.last_activity, \
           current_streak = excluded.current_streak, \
           longest_streak = excluded.longest_streak",
        params![
            state.user_id,
            state.last_activity.map(|d| d.to_rfc3339()),
            state.current_streak,
            state.longest_streak,
        ],
    )?;
    Ok(())
}

/// Current streak state for a user (zeroes if the user has never written).
pub fn streak_for(conn: &Connection, user_id: &str) -> Result<StreakState> {
    let row = conn
        .query_row(
            "SELECT last_activity, current_streak, longest_streak FROM streaks WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            },
        )
        .optional()?;

    Ok(match row {
        Some((last, current, longest)) => StreakState {
            user_id: user_id.to_string(),
            last_activity: last.as_deref().and_then(super::parse_utc),
            current_streak: current,
            longest_streak: longest,
        },
        None => StreakState::new(user_id),
    })
}

fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<JournalEntry> {
    let modality: String = row.get(4)?;
    Ok(JournalEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        prompt: row.get(2)?,
        answer: row.get(3)?,
        modality: modality.parse().unwrap_or_default(),
        tag: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        deleted_at: row.get(8)?,
    })
}

const ENTRY_COLUMNS: &str =
    "id, user_id, prompt, answer, modality, tag, created_at, updated_at, deleted_at";

/// Fetch a single entry, owner-scoped, excluding soft-deleted rows.
pub fn get_entry(conn: &Connection, user_id: &str, entry_id: &str) -> Result<JournalEntry> {
    conn.query_row(
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM entries \
             WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL"
        ),
        params![entry_id, user_id],
        entry_from_row,
    )
    .optional()?
    .ok_or(CoreError::NotFoundOrDenied)
}

/// Clamp caller-supplied pagination: page ≥ 1, per_page within 1..=50.
fn clamp_pagination(page: u32, per_page: u32, default_per_page: u32) -> (u32, u32) {
    let page = page.max(1);
    let per_page = if (1..=50).contains(&per_page) {
        per_page
    } else {
        default_per_page
    };
    (page, per_page)
}

/// List the user's entries newest-first with pagination.
pub fn list_entries(
    conn: &Connection,
    user_id: &str,
    page: u32,
    per_page: u32,
) -> Result<EntryPage> {
    let (page, per_page) = clamp_pagination(page, per_page, 10);

    // COUNT(*) comes back as SQLite's native i64.
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM entries WHERE user_id = ?1 AND deleted_at IS NULL",
        params![user_id],
        |row| row.get(0),
    )?;

    let offset = (i64::from(page) - 1) * i64::from(per_page);
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries \
         WHERE user_id = ?1 AND deleted_at IS NULL \
         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let items = stmt
        .query_map(params![user_id, per_page, offset], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(EntryPage {
        items,
        total: total as u64,
        page,
        per_page,
    })
}

/// List the user's entries carrying a specific tag, newest-first.
pub fn list_entries_by_tag(
    conn: &Connection,
    user_id: &str,
    tag: &str,
    page: u32,
    per_page: u32,
) -> Result<EntryPage> {
    let tag = clean_required(tag, MAX_TAG_CHARS, "tag")?;
    let (page, per_page) = clamp_pagination(page, per_page, 10);

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM entries WHERE user_id = ?1 AND tag = ?2 AND deleted_at IS NULL",
        params![user_id, tag],
        |row| row.get(0),
    )?;

    let offset = (i64::from(page) - 1) * i64::from(per_page);
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries \
         WHERE user_id = ?1 AND tag = ?2 AND deleted_at IS NULL \
         ORDER BY created_at DESC LIMIT ?3 OFFSET ?4"
    ))?;
    let items = stmt
        .query_map(params![user_id, tag, per_page, offset], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(EntryPage {
        items,
        total: total as u64,
        page,
        per_page,
    })
}

/// Recent non-deleted entries with non-empty answers, newest first — the
/// window query behind the chat primer and AI analysis.
pub fn list_recent_with_answers(
    conn: &Connection,
    user_id: &str,
    since: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<JournalEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries \
         WHERE user_id = ?1 AND created_at >= ?2 AND deleted_at IS NULL AND answer != '' \
         ORDER BY created_at DESC LIMIT ?3"
    ))?;
    let items = stmt
        .query_map(
            params![user_id, since.to_rfc3339(), limit as i64],
            entry_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

/// All non-deleted entries since `since`, newest first, regardless of answer
/// content — the trends window.
pub fn list_since(
    conn: &Connection,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<JournalEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries \
         WHERE user_id = ?1 AND created_at >= ?2 AND deleted_at IS NULL \
         ORDER BY created_at DESC"
    ))?;
    let items = stmt
        .query_map(params![user_id, since.to_rfc3339()], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Total non-deleted entries for the user.
pub fn count_entries(conn: &Connection, user_id: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM entries WHERE user_id = ?1 AND deleted_at IS NULL",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Update prompt/answer/tag on an existing entry. At least one field must be
/// supplied; prompt and answer may not be cleared.
pub fn update_entry(
    conn: &Connection,
    user_id: &str,
    entry_id: &str,
    patch: EntryPatch,
    now: DateTime<Utc>,
) -> Result<UpdatedEntry> {
    let mut entry = get_entry(conn, user_id, entry_id)?;
    let mut updated_fields: Vec<&'static str> = Vec::new();

    if let Some(prompt) = patch.prompt.as_deref() {
        entry.prompt = clean_required(prompt, MAX_PROMPT_CHARS, "prompt")?;
        updated_fields.push("prompt");
    }
    if let Some(answer) = patch.answer.as_deref() {
        entry.answer = clean_required(answer, MAX_ANSWER_CHARS, "answer")?;
        updated_fields.push("answer");
    }
    if let Some(tag) = patch.tag.as_deref() {
        entry.tag = clean_optional(Some(tag), MAX_TAG_CHARS, "tag")?;
        updated_fields.push("tag");
    }

    if updated_fields.is_empty() {
        return Err(CoreError::validation("no valid fields provided for update"));
    }

    entry.updated_at = now.to_rfc3339();
    conn.execute(
        "UPDATE entries SET prompt = ?1, answer = ?2, tag = ?3, updated_at = ?4 \
         WHERE id = ?5 AND user_id = ?6 AND deleted_at IS NULL",
        params![
            entry.prompt,
            entry.answer,
            entry.tag,
            entry.updated_at,
            entry_id,
            user_id,
        ],
    )?;

    tracing::info!(entry = %entry_id, user = %user_id, fields = ?updated_fields, "entry updated");

    Ok(UpdatedEntry {
        entry,
        updated_fields,
    })
}

/// Soft-delete an entry by setting `deleted_at`.
pub fn delete_entry(
    conn: &Connection,
    user_id: &str,
    entry_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE entries SET deleted_at = ?1 \
         WHERE id = ?2 AND user_id = ?3 AND deleted_at IS NULL",
        params![now.to_rfc3339(), entry_id, user_id],
    )?;
    if changed == 0 {
        return Err(CoreError::NotFoundOrDenied);
    }
    tracing::info!(entry = %entry_id, user = %user_id, "entry soft deleted");
    Ok(())
}
