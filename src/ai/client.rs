//! Resilient wrapper around a [`GenerateContent`] backend.
//!
//! Both entry points make up to `retries + 1` sequential attempts — no
//! parallel calls, no cancellation mid-loop. Callers needing bounded latency
//! impose their own outer deadline.
//!
//! The chat path never fails: every provider failure maps to a fixed
//! user-facing sentence. The analysis path surfaces only quota exhaustion;
//! everything else — malformed JSON, safety refusals, exhausted transient
//! retries — collapses into the deterministic fallback report.

use crate::ai::validate::{self, AnalysisReport};
use crate::ai::{classify, FailureClass, GenerateContent, GenerateOptions, GenerateOutcome};
use crate::ai::CHAT_SYSTEM_PROMPT;
use crate::chat::codec::Turn;
use crate::config::AiConfig;
use crate::error::{CoreError, Result};

pub const REPLY_HIGH_DEMAND: &str =
    "I'm experiencing high demand right now. Please try again in a few minutes.";
pub const REPLY_SAFETY_GUIDELINES: &str =
    "I can't respond to that due to safety guidelines. Let's discuss something else.";
pub const REPLY_SAFETY_BLOCKED: &str =
    "I can't respond to that request. Let's try discussing something else.";
pub const REPLY_REPHRASE: &str =
    "I'm having trouble forming a response. Could you try rephrasing?";
pub const REPLY_NO_CONTENT: &str =
    "I'm currently unable to generate a response. Please try again.";
pub const REPLY_TECHNICAL: &str =
    "I'm having technical difficulties. Please try again later.";

pub struct ResilientAiClient<G> {
    backend: G,
    retries: u32,
    chat_options: GenerateOptions,
    analysis_options: GenerateOptions,
}

impl<G: GenerateContent> ResilientAiClient<G> {
    pub fn new(backend: G, config: &AiConfig) -> Self {
        Self {
            backend,
            retries: config.retries,
            chat_options: GenerateOptions {
                temperature: config.chat_temperature,
                max_output_tokens: config.max_output_tokens,
                top_p: config.top_p,
            },
            // Lower temperature for more consistent JSON
            analysis_options: GenerateOptions {
                temperature: config.analysis_temperature,
                max_output_tokens: config.max_output_tokens,
                top_p: config.top_p,
            },
        }
    }

    /// Generate a chat reply. Infallible by design: every failure path has a
    /// fixed user-facing sentence.
    pub fn chat_reply(&self, turns: &[Turn]) -> String {
        for attempt in 0..=self.retries {
            match self
                .backend
                .generate(Some(CHAT_SYSTEM_PROMPT), turns, &self.chat_options)
            {
                Ok(GenerateOutcome::Text(text)) => {
                    let text = text.trim();
                    if text.is_empty() {
                        return REPLY_REPHRASE.to_string();
                    }
                    return text.to_string();
                }
                Ok(GenerateOutcome::SafetyBlocked) => return REPLY_SAFETY_BLOCKED.to_string(),
                Ok(GenerateOutcome::NoContent) => {
                    if attempt == self.retries {
                        return REPLY_NO_CONTENT.to_string();
                    }
                }
                Err(err) => {
                    tracing::warn!(attempt = attempt + 1, error = %err, "chat generation attempt failed");
                    match classify(&err.0) {
                        FailureClass::Quota => return REPLY_HIGH_DEMAND.to_string(),
                        FailureClass::Safety => return REPLY_SAFETY_GUIDELINES.to_string(),
                        FailureClass::Transient => {}
                    }
                }
            }
        }
        REPLY_TECHNICAL.to_string()
    }

    /// Run a JSON-structured analysis request. Only [`CoreError::QuotaExceeded`]
    /// escapes; every other failure resolves to the fixed fallback report.
    pub fn analyze(&self, prompt: &str) -> Result<AnalysisReport> {
        let turns = [Turn::user(prompt)];

        for attempt in 0..=self.retries {
            match self.backend.generate(None, &turns, &self.analysis_options) {
                Ok(GenerateOutcome::Text(text)) => {
                    let cleaned = strip_code_fence(&text);
                    match serde_json::from_str::<serde_json::Value>(cleaned) {
                        Ok(value) => return Ok(validate::validate(&value)),
                        Err(err) => {
                            tracing::warn!(attempt = attempt + 1, error = %err, "analysis JSON parse failed");
                        }
                    }
                }
                Ok(outcome) => {
                    tracing::warn!(attempt = attempt + 1, ?outcome, "analysis returned no usable content");
                }
                Err(err) => {
                    tracing::warn!(attempt = attempt + 1, error = %err, "analysis attempt failed");
                    match classify(&err.0) {
                        FailureClass::Quota => return Err(CoreError::QuotaExceeded),
                        FailureClass::Safety => return Ok(validate::fallback_report()),
                        FailureClass::Transient => {}
                    }
                }
            }
        }

        tracing::warn!("analysis retries exhausted, using fallback report");
        Ok(validate::fallback_report())
    }
}

/// Strip a leading ```` ```json ````/```` ``` ```` fence and a trailing
/// ```` ``` ```` fence before JSON parsing.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let mut t = text.trim();
    if let Some(rest) = t.strip_prefix("```json") {
        t = rest;
    } else if let Some(rest) = t.strip_prefix("```") {
        t = rest;
    }
    if let Some(rest) = t.strip_suffix("```") {
        t = rest;
    }
    t.trim()
}
