//! Row-level conversation store.
//!
//! Orchestration (AI calls, primer assembly) lives in
//! [`crate::chat::service`]; this module only reads and writes rows. All
//! reads scope by owner, and soft-deleted rows are excluded unless a caller
//! explicitly asks for them (the idempotent delete path needs to see them).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;

/// A `conversations` table row. The `chat` column is the codec blob.
#[derive(Debug, Clone)]
pub struct ConversationRow {
    pub id: String,
    pub user_id: String,
    pub title: Option<String>,
    pub chat: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

const COLUMNS: &str = "id, user_id, title, chat, created_at, updated_at, deleted_at";

fn row_from(row: &rusqlite::Row) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        chat: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        deleted_at: row.get(6)?,
    })
}

/// Fetch one conversation, owner-scoped. `include_deleted` lets the
/// idempotent delete path observe already-deleted rows.
pub fn find(
    conn: &Connection,
    user_id: &str,
    conversation_id: &str,
    include_deleted: bool,
) -> Result<Option<ConversationRow>> {
    let sql = if include_deleted {
        format!("SELECT {COLUMNS} FROM conversations WHERE id = ?1 AND user_id = ?2")
    } else {
        format!(
            "SELECT {COLUMNS} FROM conversations \
             WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL"
        )
    };
    Ok(conn
        .query_row(&sql, params![conversation_id, user_id], row_from)
        .optional()?)
}

/// Insert a new empty conversation and return its id.
pub fn create(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<String> {
    let id = uuid::Uuid::now_v7().to_string();
    let ts = now.to_rfc3339();
    conn.execute(
        "INSERT INTO conversations (id, user_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![id, user_id, ts],
    )?;
    Ok(id)
}

/// Persist the encoded turn blob and bump `updated_at`.
pub fn save_chat(
    conn: &Connection,
    conversation_id: &str,
    blob: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "UPDATE conversations SET chat = ?1, updated_at = ?2 WHERE id = ?3",
        params![blob, now.to_rfc3339(), conversation_id],
    )?;
    Ok(())
}

/// Set the soft-delete marker. Returns the number of rows changed.
pub fn mark_deleted(
    conn: &Connection,
    conversation_id: &str,
    now: DateTime<Utc>,
) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE conversations SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        params![now.to_rfc3339(), conversation_id],
    )?)
}

/// Store a caller-chosen title.
pub fn set_title(
    conn: &Connection,
    conversation_id: &str,
    title: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "UPDATE conversations SET title = ?1, updated_at = ?2 WHERE id = ?3",
        params![title, now.to_rfc3339(), conversation_id],
    )?;
    Ok(())
}

/// One page of the user's conversations, most recently updated first.
pub fn list_page(
    conn: &Connection,
    user_id: &str,
    page: u32,
    per_page: u32,
) -> Result<(Vec<ConversationRow>, u64)> {
    // COUNT(*) comes back as SQLite's native i64.
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM conversations WHERE user_id = ?1 AND deleted_at IS NULL",
        params![user_id],
        |row| row.get(0),
    )?;

    let offset = (i64::from(page) - 1) * i64::from(per_page);
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM conversations \
         WHERE user_id = ?1 AND deleted_at IS NULL \
         ORDER BY updated_at DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let rows = stmt
        .query_map(params![user_id, per_page, offset], row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((rows, total as u64))
}
