//! Structural validation and clamping of AI analysis output.
//!
//! The provider returns free-form JSON; [`validate`] forces it into the
//! fixed [`AnalysisReport`] shape. Every field is clamped by item count and
//! per-item length, and a field that ends up empty is replaced with its
//! fixed default set — the caller never sees an empty field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_PATTERNS: usize = 5;
pub const MAX_PATTERN_CHARS: usize = 200;
pub const MAX_INSIGHTS: usize = 3;
pub const MAX_INSIGHT_CHARS: usize = 300;
pub const MAX_SUGGESTED_PROMPTS: usize = 5;
pub const MAX_SUGGESTED_PROMPT_CHARS: usize = 150;

const DEFAULT_PATTERNS: &[&str] =
    &["Continue journaling to identify patterns in your thoughts and experiences"];

const DEFAULT_INSIGHTS: &[&str] =
    &["Your journaling practice shows commitment to self-reflection and growth"];

const DEFAULT_SUGGESTED_PROMPTS: &[&str] = &[
    "What did I learn about myself today?",
    "What am I most grateful for right now?",
    "How have I grown or changed recently?",
];

/// Validated, clamped analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub patterns: Vec<String>,
    pub insights: Vec<String>,
    pub suggested_prompts: Vec<String>,
}

/// Extract a clamped string list from a JSON field. Non-list or missing
/// values yield an empty list; falsy items (null, empty/blank strings,
/// `false`, `0`) are dropped before the count cap is applied; survivors are
/// truncated to `max_chars` characters.
fn clamp_list(value: Option<&Value>, max_items: usize, max_chars: usize) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::String(_) | Value::Null | Value::Bool(false) => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        })
        .take(max_items)
        .map(|s| s.chars().take(max_chars).collect())
        .collect()
}

/// Validate raw AI JSON into an [`AnalysisReport`], substituting the fixed
/// defaults for any field that clamps down to nothing.
pub fn validate(raw: &Value) -> AnalysisReport {
    let mut patterns = clamp_list(raw.get("patterns"), MAX_PATTERNS, MAX_PATTERN_CHARS);
    let mut insights = clamp_list(raw.get("insights"), MAX_INSIGHTS, MAX_INSIGHT_CHARS);
    let mut suggested_prompts = clamp_list(
        raw.get("suggested_prompts"),
        MAX_SUGGESTED_PROMPTS,
        MAX_SUGGESTED_PROMPT_CHARS,
    );

    if patterns.is_empty() {
        patterns = DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect();
    }
    if insights.is_empty() {
        insights = DEFAULT_INSIGHTS.iter().map(|s| s.to_string()).collect();
    }
    if suggested_prompts.is_empty() {
        suggested_prompts = DEFAULT_SUGGESTED_PROMPTS
            .iter()
            .map(|s| s.to_string())
            .collect();
    }

    AnalysisReport {
        patterns,
        insights,
        suggested_prompts,
    }
}

/// The full fixed fallback payload used when the AI call itself fails.
pub fn fallback_report() -> AnalysisReport {
    AnalysisReport {
        patterns: vec![
            "Your consistent journaling shows dedication to self-reflection".into(),
            "You're actively engaging with your thoughts and experiences".into(),
            "Regular writing practice indicates commitment to personal growth".into(),
        ],
        insights: vec![
            "Maintaining a journal demonstrates self-awareness and mindfulness".into(),
            "Your writing practice creates space for processing daily experiences".into(),
        ],
        suggested_prompts: vec![
            "What did I accomplish today that I'm proud of?".into(),
            "What challenge helped me learn something new about myself?".into(),
            "What am I looking forward to in the coming days?".into(),
            "How did I show kindness to myself or others today?".into(),
            "What would I like to focus on improving tomorrow?".into(),
        ],
    }
}
