//! AI-service boundary: the backend seam, failure classification, and the
//! resilient client built on top of them.
//!
//! Raw provider error text is interpreted in exactly one place —
//! [`classify`], used only by [`client::ResilientAiClient`]. Everything else
//! in the crate sees typed outcomes and canned content.

pub mod client;
pub mod gemini;
pub mod validate;

use thiserror::Error;

use crate::chat::codec::Turn;

/// Raw error from a provider backend. The message is opaque to callers; only
/// the resilient client's classifier reads it.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// How a provider failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Quota or rate exhaustion. Fatal, never retried.
    Quota,
    /// Request refused on safety grounds. Fatal, never retried.
    Safety,
    /// Anything else. Retried until the budget is exhausted.
    Transient,
}

/// Classify a provider error by case-insensitive substring match on its text.
pub fn classify(error_text: &str) -> FailureClass {
    let lower = error_text.to_lowercase();
    if lower.contains("quota") || lower.contains("limit") {
        FailureClass::Quota
    } else if lower.contains("safety") {
        FailureClass::Safety
    } else {
        FailureClass::Transient
    }
}

/// Sampling parameters for one generation request.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
}

/// Non-error outcomes of a generation request. A safety block or an empty
/// candidate list is a valid response, not an exception.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    Text(String),
    SafetyBlocked,
    NoContent,
}

/// The external AI service contract. One synchronous round-trip per call;
/// retry policy lives in the client, not the backend.
pub trait GenerateContent {
    fn generate(
        &self,
        system: Option<&str>,
        turns: &[Turn],
        options: &GenerateOptions,
    ) -> Result<GenerateOutcome, ProviderError>;
}

impl<G: GenerateContent + ?Sized> GenerateContent for &G {
    fn generate(
        &self,
        system: Option<&str>,
        turns: &[Turn],
        options: &GenerateOptions,
    ) -> Result<GenerateOutcome, ProviderError> {
        (**self).generate(system, turns, options)
    }
}

/// Persona for the chat companion.
pub const CHAT_SYSTEM_PROMPT: &str = "You are Kai, a compassionate and insightful journaling companion. Help users explore \
their thoughts and feelings with empathy and wisdom. Ask thoughtful questions, offer \
gentle perspectives, and help users connect insights from their experiences. \
Keep responses conversational, supportive, and under 200 words unless more detail is specifically requested. \
If referencing their journal entries, do so thoughtfully and with respect for their privacy. \
Focus on encouraging self-reflection and personal growth.";
