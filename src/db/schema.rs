//! SQL DDL for all daybook tables.
//!
//! Defines the `entries`, `streaks`, `conversations`, and `schema_meta`
//! tables. All DDL uses `IF NOT EXISTS` for idempotent initialization.
//! Soft deletes are a nullable `deleted_at` column; every read query in the
//! stores filters on it.

use rusqlite::Connection;

/// All schema DDL statements for daybook's core tables.
const SCHEMA_SQL: &str = r#"
-- Journal entries (one non-deleted entry per user per UTC calendar day)
CREATE TABLE IF NOT EXISTS entries (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    prompt TEXT NOT NULL,
    answer TEXT NOT NULL,
    modality TEXT NOT NULL DEFAULT 'text' CHECK(modality IN ('text','image','audio')),
    tag TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_entries_user ON entries(user_id);
CREATE INDEX IF NOT EXISTS idx_entries_created ON entries(created_at);
CREATE INDEX IF NOT EXISTS idx_entries_tag ON entries(tag);

-- Per-user streak state, advanced atomically with entry creation
CREATE TABLE IF NOT EXISTS streaks (
    user_id TEXT PRIMARY KEY,
    last_activity TEXT,
    current_streak INTEGER NOT NULL DEFAULT 0 CHECK(current_streak >= 0),
    longest_streak INTEGER NOT NULL DEFAULT 0 CHECK(longest_streak >= 0)
);

-- Conversations; `chat` holds the codec-encoded turn sequence
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT,
    chat TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations(user_id);
CREATE INDEX IF NOT EXISTS idx_conversations_updated ON conversations(updated_at);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
