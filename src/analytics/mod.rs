//! Journal analytics.
//!
//! [`analyze`] is the AI-backed path: entries within the window are
//! sanitized, formatted, and sent through the resilient client, with the
//! validated report memoized in the `analysis_cache` table. [`mood_trends`]
//! and [`summary`] are pure store aggregations with no AI involvement.

pub mod cache;

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::ai::client::ResilientAiClient;
use crate::ai::validate::AnalysisReport;
use crate::ai::GenerateContent;
use crate::config::AnalysisConfig;
use crate::error::{CoreError, Result};
use crate::journal::entries::{count_entries, list_recent_with_answers, list_since, streak_for};
use crate::journal::parse_utc;
use crate::journal::types::JournalEntry;
use crate::sanitize::sanitize;

const MIN_DAYS: u32 = 1;
const MAX_DAYS: u32 = 365;
const MIN_MAX_ENTRIES: u32 = 1;
const MAX_MAX_ENTRIES: u32 = 50;

// Tighter truncation than the chat primer: analysis batches many entries.
const TOPIC_CHARS: usize = 50;
const CONTENT_CHARS: usize = 200;

pub const MSG_ANALYSIS_OK: &str = "Analysis completed successfully";
pub const MSG_NO_ENTRIES: &str = "No journal entries found for analysis";
pub const MSG_NEED_MORE: &str = "Need more entries for comprehensive analysis";

/// Caller-supplied analysis parameters, pre-filled from config defaults.
#[derive(Debug, Clone)]
pub struct AnalysisParams {
    pub days: u32,
    pub max_entries: u32,
    pub force_refresh: bool,
}

impl AnalysisParams {
    pub fn defaults(config: &AnalysisConfig) -> Self {
        Self {
            days: config.default_days,
            max_entries: config.default_max_entries,
            force_refresh: false,
        }
    }
}

/// The analyzed window, dates only.
#[derive(Debug, Clone, Serialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
    pub days: u32,
}

impl DateRange {
    fn new(from: DateTime<Utc>, to: DateTime<Utc>, days: u32) -> Self {
        Self {
            from: from.format("%Y-%m-%d").to_string(),
            to: to.format("%Y-%m-%d").to_string(),
            days,
        }
    }
}

/// Result of one analysis request.
#[derive(Debug, Serialize)]
pub struct AnalysisOutcome {
    pub message: String,
    pub results: AnalysisReport,
    pub entries_analyzed: usize,
    pub date_range: DateRange,
    pub cached: bool,
}

fn validate_days(days: u32) -> Result<()> {
    if !(MIN_DAYS..=MAX_DAYS).contains(&days) {
        return Err(CoreError::validation(format!(
            "days parameter must be between {MIN_DAYS} and {MAX_DAYS}"
        )));
    }
    Ok(())
}

/// Analyze the user's recent entries. Windows with no entries or fewer than
/// the configured minimum return canned encouragement without touching the
/// AI provider or the cache.
pub fn analyze<G: GenerateContent>(
    conn: &Connection,
    client: &ResilientAiClient<G>,
    config: &AnalysisConfig,
    user_id: &str,
    params: &AnalysisParams,
    now: DateTime<Utc>,
) -> Result<AnalysisOutcome> {
    validate_days(params.days)?;
    if !(MIN_MAX_ENTRIES..=MAX_MAX_ENTRIES).contains(&params.max_entries) {
        return Err(CoreError::validation(format!(
            "max_entries parameter must be between {MIN_MAX_ENTRIES} and {MAX_MAX_ENTRIES}"
        )));
    }

    let cutoff = now - Duration::days(i64::from(params.days));
    let entries = list_recent_with_answers(conn, user_id, cutoff, params.max_entries as usize)?;
    let date_range = DateRange::new(cutoff, now, params.days);

    if entries.is_empty() {
        return Ok(AnalysisOutcome {
            message: MSG_NO_ENTRIES.to_string(),
            results: no_entries_report(),
            entries_analyzed: 0,
            date_range,
            cached: false,
        });
    }
    if entries.len() < config.min_entries {
        return Ok(AnalysisOutcome {
            message: MSG_NEED_MORE.to_string(),
            results: below_minimum_report(),
            entries_analyzed: entries.len(),
            date_range,
            cached: false,
        });
    }

    let ids: Vec<String> = entries.iter().map(|entry| entry.id.clone()).collect();
    let key = cache::cache_key(user_id, params.days, params.max_entries, &ids);

    if !params.force_refresh {
        if let Some(report) = cache::lookup(conn, &key, config.cache_ttl_secs, now)? {
            tracing::info!(user = %user_id, entries = entries.len(), "returning cached analysis");
            return Ok(AnalysisOutcome {
                message: MSG_ANALYSIS_OK.to_string(),
                results: report,
                entries_analyzed: entries.len(),
                date_range,
                cached: true,
            });
        }
    }

    let prompt = analysis_prompt(&format_entries(&entries));
    let report = client.analyze(&prompt)?;
    // Fallback content is not memoized; a healthy provider should be tried
    // again on the next request.
    if report != crate::ai::validate::fallback_report() {
        cache::store(conn, &key, &report, now)?;
    }

    tracing::info!(
        user = %user_id,
        entries = entries.len(),
        days = params.days,
        "analysis completed"
    );

    Ok(AnalysisOutcome {
        message: MSG_ANALYSIS_OK.to_string(),
        results: report,
        entries_analyzed: entries.len(),
        date_range,
        cached: false,
    })
}

/// One sanitized line per entry, blank-line separated. Dates are month-day
/// only; prompt and answer pass through the PII sanitizer.
fn format_entries(entries: &[JournalEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let date = parse_utc(&entry.created_at)
                .map(|ts| ts.format("%m-%d").to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            format!(
                "Date: {date}, Modality: {}, Topic: {}, Content: {}",
                entry.modality,
                sanitize(&entry.prompt, TOPIC_CHARS),
                sanitize(&entry.answer, CONTENT_CHARS),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn analysis_prompt(sanitized_entries: &str) -> String {
    format!(
        "You are a supportive journal analysis assistant. Analyze these journal entries and provide \
         encouraging, constructive insights. Focus on positive patterns and growth opportunities.\n\n\
         Provide your response in this exact JSON format (no markdown code blocks):\n\
         {{\n\
         \x20 \"patterns\": [\"pattern1\", \"pattern2\", \"pattern3\"],\n\
         \x20 \"insights\": [\"insight1\", \"insight2\"],\n\
         \x20 \"suggested_prompts\": [\"prompt1\", \"prompt2\", \"prompt3\"]\n\
         }}\n\n\
         Guidelines:\n\
         - Keep responses encouraging and constructive\n\
         - Focus on personal growth and positive developments\n\
         - Suggest thoughtful, open-ended prompts for future journaling\n\
         - Be specific but not overly personal\n\n\
         Journal entries to analyze:\n{sanitized_entries}"
    )
}

fn no_entries_report() -> AnalysisReport {
    AnalysisReport {
        patterns: vec!["No entries available for analysis".to_string()],
        insights: vec!["Start journaling to unlock personalized insights".to_string()],
        suggested_prompts: vec![
            "What happened today that I want to remember?".to_string(),
            "How am I feeling right now and why?".to_string(),
            "What is one thing I'm grateful for today?".to_string(),
        ],
    }
}

fn below_minimum_report() -> AnalysisReport {
    AnalysisReport {
        patterns: vec!["Continue journaling to identify meaningful patterns".to_string()],
        insights: vec![
            "You're building a valuable habit of self-reflection".to_string(),
            "Each entry contributes to your personal growth journey".to_string(),
        ],
        suggested_prompts: vec![
            "What emotions did I experience today?".to_string(),
            "What went well today and what could be improved?".to_string(),
            "What would I like to focus on tomorrow?".to_string(),
        ],
    }
}

/// One day's entry count, keyed by `YYYY-MM-DD`.
#[derive(Debug, Serialize)]
pub struct DailyActivity {
    pub date: String,
    pub entries: u32,
}

/// Activity trends over a window, no AI involved.
#[derive(Debug, Serialize)]
pub struct MoodTrends {
    pub total_entries: usize,
    pub entries_by_modality: BTreeMap<String, u32>,
    pub daily_activity: Vec<DailyActivity>,
    pub active_days: usize,
    pub date_range: DateRange,
}

/// Per-modality and per-day activity counts over the last `days` days.
pub fn mood_trends(
    conn: &Connection,
    user_id: &str,
    days: u32,
    now: DateTime<Utc>,
) -> Result<MoodTrends> {
    validate_days(days)?;

    let cutoff = now - Duration::days(i64::from(days));
    let entries = list_since(conn, user_id, cutoff)?;

    let mut entries_by_modality: BTreeMap<String, u32> = BTreeMap::new();
    let mut daily: BTreeMap<String, u32> = BTreeMap::new();
    for entry in &entries {
        *entries_by_modality
            .entry(entry.modality.to_string())
            .or_insert(0) += 1;
        if let Some(ts) = parse_utc(&entry.created_at) {
            *daily.entry(ts.format("%Y-%m-%d").to_string()).or_insert(0) += 1;
        }
    }

    let active_days = daily.len();
    let daily_activity = daily
        .into_iter()
        .map(|(date, entries)| DailyActivity { date, entries })
        .collect();

    Ok(MoodTrends {
        total_entries: entries.len(),
        entries_by_modality,
        daily_activity,
        active_days,
        date_range: DateRange::new(cutoff, now, days),
    })
}

/// Quick stats over the whole journal plus the last 30 days, no AI involved.
#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub total_entries: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub entries_this_month: usize,
    pub most_active_day: Option<String>,
    pub entries_by_day: BTreeMap<String, u32>,
}

pub fn summary(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<AnalyticsSummary> {
    let total_entries = count_entries(conn, user_id)?;
    let streak = streak_for(conn, user_id)?;

    if total_entries == 0 {
        return Ok(AnalyticsSummary {
            total_entries: 0,
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            entries_this_month: 0,
            most_active_day: None,
            entries_by_day: BTreeMap::new(),
        });
    }

    let cutoff = now - Duration::days(30);
    let recent = list_since(conn, user_id, cutoff)?;

    let mut entries_by_day: BTreeMap<String, u32> = BTreeMap::new();
    for entry in &recent {
        if let Some(ts) = parse_utc(&entry.created_at) {
            *entries_by_day.entry(ts.format("%A").to_string()).or_insert(0) += 1;
        }
    }
    let most_active_day = entries_by_day
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(day, _)| day.clone());

    Ok(AnalyticsSummary {
        total_entries,
        current_streak: streak.current_streak,
        longest_streak: streak.longest_streak,
        entries_this_month: recent.len(),
        most_active_day,
        entries_by_day,
    })
}
