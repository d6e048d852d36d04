//! Chat message flow and conversation queries.
//!
//! [`post_message`] is the write path: validate, load-or-create the
//! conversation, assemble the AI input (history plus the new user turn,
//! with the journal primer injected only for brand-new conversations), get
//! a reply, then append both turns and commit conversation row + blob in one
//! transaction. The AI round-trip happens outside the transaction; only the
//! durable mutations are inside it.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::ai::client::ResilientAiClient;
use crate::ai::GenerateContent;
use crate::chat::codec::{self, Role, Turn};
use crate::chat::context::build_initial_context;
use crate::chat::store;
use crate::config::ContextConfig;
use crate::error::{CoreError, Result};
use crate::journal::entries::list_recent_with_answers;

pub const MAX_MESSAGE_CHARS: usize = 2000;
pub const MAX_TITLE_CHARS: usize = 100;

const TITLE_PREVIEW_CHARS: usize = 40;
const LAST_MESSAGE_PREVIEW_CHARS: usize = 60;

/// Result of posting one message.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub conversation_id: String,
    pub ai_message: String,
    pub user_message_echo: String,
    pub is_new_conversation: bool,
}

/// One conversation in a listing.
#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub last_message_preview: String,
    pub message_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationPage {
    pub items: Vec<ConversationSummary>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

/// Full decoded history of one conversation, cleaned for display.
#[derive(Debug, Serialize)]
pub struct ConversationHistory {
    pub conversation_id: String,
    pub title: String,
    pub turns: Vec<Turn>,
    pub message_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

fn validate_message(message: &str) -> Result<String> {
    let message = message.trim();
    if message.is_empty() {
        return Err(CoreError::validation("message cannot be empty"));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(CoreError::validation(format!(
            "message too long (maximum {MAX_MESSAGE_CHARS} characters)"
        )));
    }
    Ok(message.to_string())
}

/// Post a user message, creating the conversation if no id was given.
pub fn post_message<G: GenerateContent>(
    conn: &mut Connection,
    client: &ResilientAiClient<G>,
    context_config: &ContextConfig,
    user_id: &str,
    message: &str,
    conversation_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ChatReply> {
    let message = validate_message(message)?;

    let (existing_id, mut history, primer) = match conversation_id {
        Some(id) => {
            let row = store::find(conn, user_id, id, false)?.ok_or(CoreError::NotFoundOrDenied)?;
            (Some(row.id), codec::decode(row.chat.as_deref()), None)
        }
        None => {
            // Journal primer is assembled only for the very first turn of a
            // new conversation.
            let since = now - Duration::days(context_config.window_days);
            let recent =
                list_recent_with_answers(conn, user_id, since, context_config.max_entries)?;
            (None, Vec::new(), Some(build_initial_context(&recent)))
        }
    };

    // AI input: stored history plus the new user turn. The primer rides as an
    // invisible leading part of that turn and is never persisted.
    let mut contents = history.clone();
    let mut parts = Vec::new();
    if let Some(primer) = primer {
        parts.push(primer);
    }
    parts.push(message.clone());
    contents.push(Turn {
        role: Role::User,
        parts,
    });

    let ai_message = client.chat_reply(&contents);

    history.push(Turn::user(message.clone()));
    history.push(Turn::model(ai_message.clone()));
    let blob = codec::encode(&history);

    let tx = conn.transaction()?;
    let (id, is_new) = match existing_id {
        Some(id) => (id, false),
        None => (store::create(&tx, user_id, now)?, true),
    };
    store::save_chat(&tx, &id, &blob, now)?;
    tx.commit()?;

    tracing::info!(
        user = %user_id,
        conversation = %id,
        new_chat = is_new,
        "chat message processed"
    );

    Ok(ChatReply {
        conversation_id: id,
        ai_message,
        user_message_echo: message,
        is_new_conversation: is_new,
    })
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Derive a display title from the first substantial user message.
pub fn derive_title(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "New Chat".to_string();
    }
    for turn in turns {
        if turn.role == Role::User {
            let text = turn.display_text().trim();
            if text.chars().count() > 3 {
                return truncate_with_ellipsis(text, TITLE_PREVIEW_CHARS);
            }
        }
    }
    "Chat Session".to_string()
}

fn last_model_preview(turns: &[Turn]) -> String {
    turns
        .iter()
        .rev()
        .find(|turn| turn.role == Role::Model && !turn.display_text().is_empty())
        .map(|turn| truncate_with_ellipsis(turn.display_text(), LAST_MESSAGE_PREVIEW_CHARS))
        .unwrap_or_default()
}

/// List the user's conversations, most recently updated first. A row whose
/// blob fails to decode contributes an empty history instead of failing the
/// whole listing.
pub fn list_conversations(
    conn: &Connection,
    user_id: &str,
    page: u32,
    per_page: u32,
) -> Result<ConversationPage> {
    let page = page.max(1);
    let per_page = if (1..=50).contains(&per_page) {
        per_page
    } else {
        20
    };

    let (rows, total) = store::list_page(conn, user_id, page, per_page)?;

    let items = rows
        .into_iter()
        .map(|row| {
            let turns = codec::decode(row.chat.as_deref());
            let title = row.title.clone().unwrap_or_else(|| derive_title(&turns));
            ConversationSummary {
                id: row.id,
                title,
                last_message_preview: last_model_preview(&turns),
                message_count: turns.len(),
                created_at: row.created_at,
                updated_at: row.updated_at,
            }
        })
        .collect();

    Ok(ConversationPage {
        items,
        total,
        page,
        per_page,
    })
}

/// Full history of one conversation, with user turns collapsed to their
/// displayable part so injected context never reaches a reader.
pub fn conversation_history(
    conn: &Connection,
    user_id: &str,
    conversation_id: &str,
) -> Result<ConversationHistory> {
    let row = store::find(conn, user_id, conversation_id, false)?
        .ok_or(CoreError::NotFoundOrDenied)?;
    let turns = codec::decode(row.chat.as_deref());

    let cleaned: Vec<Turn> = turns
        .iter()
        .filter_map(|turn| match turn.role {
            Role::User => {
                if turn.parts.is_empty() {
                    None
                } else {
                    Some(Turn::user(turn.display_text()))
                }
            }
            Role::Model => Some(turn.clone()),
        })
        .collect();

    let title = row.title.clone().unwrap_or_else(|| derive_title(&turns));

    Ok(ConversationHistory {
        conversation_id: row.id,
        title,
        message_count: cleaned.len(),
        turns: cleaned,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Soft-delete a conversation. Idempotent: deleting an already-deleted
/// conversation succeeds and reports `already_deleted = true`.
pub fn delete_conversation(
    conn: &Connection,
    user_id: &str,
    conversation_id: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let row = store::find(conn, user_id, conversation_id, true)?
        .ok_or(CoreError::NotFoundOrDenied)?;
    if row.deleted_at.is_some() {
        return Ok(true);
    }
    store::mark_deleted(conn, conversation_id, now)?;
    tracing::info!(user = %user_id, conversation = %conversation_id, "conversation soft deleted");
    Ok(false)
}

/// Set a custom title on a conversation.
pub fn rename_conversation(
    conn: &Connection,
    user_id: &str,
    conversation_id: &str,
    title: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::validation("title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(CoreError::validation(format!(
            "title too long (maximum {MAX_TITLE_CHARS} characters)"
        )));
    }

    store::find(conn, user_id, conversation_id, false)?.ok_or(CoreError::NotFoundOrDenied)?;
    store::set_title(conn, conversation_id, title, now)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_title_uses_first_substantial_user_message() {
        let turns = vec![
            Turn::user("hi"), // too short
            Turn::model("hello!"),
            Turn::user("tell me about my journaling habits please"),
        ];
        assert_eq!(
            derive_title(&turns),
            "tell me about my journaling habits pleas..."
        );
    }

    #[test]
    fn derive_title_fallbacks() {
        assert_eq!(derive_title(&[]), "New Chat");
        assert_eq!(derive_title(&[Turn::model("only model")]), "Chat Session");
    }

    #[test]
    fn short_titles_have_no_ellipsis() {
        assert_eq!(derive_title(&[Turn::user("good day")]), "good day");
    }

    #[test]
    fn message_validation_bounds() {
        assert!(validate_message("  ").is_err());
        assert!(validate_message(&"x".repeat(2001)).is_err());
        assert_eq!(validate_message(" hello ").unwrap(), "hello");
    }

    #[test]
    fn last_model_preview_truncates() {
        let turns = vec![Turn::user("q"), Turn::model("m".repeat(80))];
        let preview = last_model_preview(&turns);
        assert_eq!(preview.chars().count(), 63); // 60 + "..."
        assert!(preview.ends_with("..."));
    }
}
