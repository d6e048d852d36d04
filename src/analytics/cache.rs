//! Fingerprinting and TTL-bounded storage for analysis results.
//!
//! The key is a pure function of the request: owner, window, entry cap, and
//! the *sorted* set of entry ids. Any entry appearing, disappearing, or being
//! soft-deleted inside the window changes the id set and therefore the key,
//! so a stale cache row is simply never looked up again and ages out.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::ai::validate::AnalysisReport;
use crate::error::Result;
use crate::journal::parse_utc;

/// Deterministic fingerprint of one analysis request. Entry-id ordering in
/// the input does not affect the output.
pub fn cache_key(user_id: &str, days: u32, max_entries: u32, entry_ids: &[String]) -> String {
    let mut ids: Vec<&str> = entry_ids.iter().map(String::as_str).collect();
    ids.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(days.to_be_bytes());
    hasher.update(max_entries.to_be_bytes());
    for id in ids {
        hasher.update(id.as_bytes());
        hasher.update([0x1f]);
    }
    format!("analytics_{:x}", hasher.finalize())
}

/// Fetch a cached report if one exists and is younger than `ttl_secs`.
/// Unparseable payloads and timestamps count as misses.
pub fn lookup(
    conn: &Connection,
    key: &str,
    ttl_secs: i64,
    now: DateTime<Utc>,
) -> Result<Option<AnalysisReport>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT payload, created_at FROM analysis_cache WHERE cache_key = ?1",
            params![key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((payload, created_at)) = row else {
        return Ok(None);
    };

    let fresh = parse_utc(&created_at)
        .map(|created| (now - created).num_seconds() < ttl_secs)
        .unwrap_or(false);
    if !fresh {
        return Ok(None);
    }

    Ok(serde_json::from_str(&payload).ok())
}

/// Upsert the report under `key`, stamping it with `now`.
pub fn store(
    conn: &Connection,
    key: &str,
    report: &AnalysisReport,
    now: DateTime<Utc>,
) -> Result<()> {
    let payload = serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string());
    conn.execute(
        "INSERT INTO analysis_cache (cache_key, payload, created_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(cache_key) DO UPDATE SET \
         payload = excluded.payload, created_at = excluded.created_at",
        params![key, payload, now.to_rfc3339()],
    )?;
    Ok(())
}
