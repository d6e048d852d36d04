#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};

use daybook::ai::client::ResilientAiClient;
use daybook::ai::{GenerateContent, GenerateOptions, GenerateOutcome, ProviderError};
use daybook::chat::codec::Turn;
use daybook::config::AiConfig;
use daybook::db;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Insert an entry row directly, backdated `days_ago` days before `now`.
/// Bypasses the service layer so tests can build arbitrary histories without
/// tripping the one-entry-per-day rule.
pub fn seed_entry(
    conn: &Connection,
    user_id: &str,
    prompt: &str,
    answer: &str,
    days_ago: i64,
    now: DateTime<Utc>,
) -> String {
    let id = uuid::Uuid::now_v7().to_string();
    let ts = (now - Duration::days(days_ago)).to_rfc3339();
    conn.execute(
        "INSERT INTO entries (id, user_id, prompt, answer, modality, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 'text', ?5, ?5)",
        params![id, user_id, prompt, answer, ts],
    )
    .unwrap();
    id
}

/// A scripted [`GenerateContent`] backend. Each call pops the next response;
/// an exhausted script yields a transient error. Records every call's turns
/// so tests can assert on what was actually sent.
pub struct ScriptedBackend {
    responses: RefCell<VecDeque<Result<GenerateOutcome, ProviderError>>>,
    calls: RefCell<Vec<Vec<Turn>>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Result<GenerateOutcome, ProviderError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// A backend that answers every call with the same text.
    pub fn reply(text: &str) -> Self {
        Self::new(
            (0..8)
                .map(|_| Ok(GenerateOutcome::Text(text.to_string())))
                .collect(),
        )
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// The turns passed to call number `index` (zero-based).
    pub fn sent_turns(&self, index: usize) -> Vec<Turn> {
        self.calls.borrow()[index].clone()
    }
}

impl GenerateContent for ScriptedBackend {
    fn generate(
        &self,
        _system: Option<&str>,
        turns: &[Turn],
        _options: &GenerateOptions,
    ) -> Result<GenerateOutcome, ProviderError> {
        self.calls.borrow_mut().push(turns.to_vec());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError("script exhausted".to_string())))
    }
}

/// Wrap a scripted backend in the resilient client with default settings
/// (2 retries).
pub fn test_client(backend: ScriptedBackend) -> ResilientAiClient<ScriptedBackend> {
    ResilientAiClient::new(backend, &AiConfig::default())
}
