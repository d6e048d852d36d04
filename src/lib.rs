//! Daybook — the core of a personal journaling service.
//!
//! The interesting part of a journaling service is not CRUD. It is the layer
//! that turns private, unreliable free text into safe, bounded interactions
//! with an external generative-AI service, while keeping two pieces of
//! derived state honest: a daily-activity streak and append-only
//! conversations.
//!
//! # Architecture
//!
//! - **Storage**: SQLite via `rusqlite` (WAL mode), soft deletes everywhere,
//!   one write operation in flight per request-scoped call
//! - **Privacy**: every journal string is truncated and PII-redacted before
//!   it crosses the trust boundary to the AI provider
//! - **Resilience**: AI calls run through a bounded retry loop with error
//!   classification and deterministic fallback content, so callers always
//!   receive a well-formed result
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and migrations
//! - [`journal`] — Entries, the streak state machine, and the entry store
//! - [`sanitize`] — PII redaction applied before content leaves the process
//! - [`chat`] — Conversations: turn codec, journal primer, message flow
//! - [`ai`] — Resilient AI client, response validation, and the Gemini backend
//! - [`analytics`] — AI-assisted entry analysis with memoization, trends, summary
//! - [`error`] — The crate-wide error taxonomy

pub mod ai;
pub mod analytics;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod journal;
pub mod sanitize;
