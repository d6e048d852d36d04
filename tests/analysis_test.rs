mod helpers;

use chrono::Utc;
use rusqlite::params;

use daybook::ai::client::ResilientAiClient;
use daybook::ai::validate::fallback_report;
use daybook::ai::{GenerateOutcome, ProviderError};
use daybook::analytics::{analyze, mood_trends, summary, AnalysisParams};
use daybook::config::{AiConfig, AnalysisConfig};
use daybook::error::CoreError;

use helpers::ScriptedBackend;

const REPORT_JSON: &str = r#"```json
{
  "patterns": ["You write most in the morning"],
  "insights": ["Consistency is building"],
  "suggested_prompts": ["What woke you up today?"]
}
```"#;

fn params() -> AnalysisParams {
    AnalysisParams::defaults(&AnalysisConfig::default())
}

#[test]
fn empty_window_returns_canned_report_without_ai() {
    let conn = helpers::test_db();
    let backend = ScriptedBackend::reply("should not be called");
    let client = ResilientAiClient::new(&backend, &AiConfig::default());

    let outcome = analyze(
        &conn,
        &client,
        &AnalysisConfig::default(),
        "u1",
        &params(),
        Utc::now(),
    )
    .unwrap();

    assert_eq!(outcome.message, "No journal entries found for analysis");
    assert_eq!(outcome.entries_analyzed, 0);
    assert_eq!(
        outcome.results.patterns,
        vec!["No entries available for analysis"]
    );
    assert!(!outcome.cached);
    assert_eq!(backend.call_count(), 0);
}

#[test]
fn below_minimum_returns_encouragement_without_ai() {
    let conn = helpers::test_db();
    let now = Utc::now();
    helpers::seed_entry(&conn, "u1", "p1", "a1", 1, now);
    helpers::seed_entry(&conn, "u1", "p2", "a2", 2, now);

    let backend = ScriptedBackend::reply("should not be called");
    let client = ResilientAiClient::new(&backend, &AiConfig::default());

    let outcome = analyze(
        &conn,
        &client,
        &AnalysisConfig::default(),
        "u1",
        &params(),
        now,
    )
    .unwrap();

    assert_eq!(outcome.message, "Need more entries for comprehensive analysis");
    assert_eq!(outcome.entries_analyzed, 2);
    assert_eq!(
        outcome.results.patterns,
        vec!["Continue journaling to identify meaningful patterns"]
    );
    assert_eq!(backend.call_count(), 0);
}

#[test]
fn fenced_json_is_parsed_validated_and_cached() {
    let conn = helpers::test_db();
    let now = Utc::now();
    for i in 1..=3 {
        helpers::seed_entry(&conn, "u1", &format!("p{i}"), "wrote something", i, now);
    }

    let backend = ScriptedBackend::new(vec![Ok(GenerateOutcome::Text(REPORT_JSON.to_string()))]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    let config = AnalysisConfig::default();

    let first = analyze(&conn, &client, &config, "u1", &params(), now).unwrap();
    assert_eq!(first.message, "Analysis completed successfully");
    assert_eq!(first.entries_analyzed, 3);
    assert!(!first.cached);
    assert_eq!(
        first.results.patterns,
        vec!["You write most in the morning"]
    );
    assert_eq!(backend.call_count(), 1);

    // Identical request within the TTL hits the cache, no provider call.
    let second = analyze(&conn, &client, &config, "u1", &params(), now).unwrap();
    assert!(second.cached);
    assert_eq!(second.results, first.results);
    assert_eq!(backend.call_count(), 1);
}

#[test]
fn force_refresh_bypasses_the_cache() {
    let conn = helpers::test_db();
    let now = Utc::now();
    for i in 1..=3 {
        helpers::seed_entry(&conn, "u1", &format!("p{i}"), "a", i, now);
    }

    let backend = ScriptedBackend::new(vec![
        Ok(GenerateOutcome::Text(REPORT_JSON.to_string())),
        Ok(GenerateOutcome::Text(REPORT_JSON.to_string())),
    ]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    let config = AnalysisConfig::default();

    analyze(&conn, &client, &config, "u1", &params(), now).unwrap();

    let mut refresh = params();
    refresh.force_refresh = true;
    let outcome = analyze(&conn, &client, &config, "u1", &refresh, now).unwrap();
    assert!(!outcome.cached);
    assert_eq!(backend.call_count(), 2);
}

#[test]
fn new_entry_in_window_changes_the_cache_key() {
    let conn = helpers::test_db();
    let now = Utc::now();
    for i in 1..=3 {
        helpers::seed_entry(&conn, "u1", &format!("p{i}"), "a", i, now);
    }

    let backend = ScriptedBackend::new(vec![
        Ok(GenerateOutcome::Text(REPORT_JSON.to_string())),
        Ok(GenerateOutcome::Text(REPORT_JSON.to_string())),
    ]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    let config = AnalysisConfig::default();

    analyze(&conn, &client, &config, "u1", &params(), now).unwrap();
    helpers::seed_entry(&conn, "u1", "p4", "a", 4, now);
    let outcome = analyze(&conn, &client, &config, "u1", &params(), now).unwrap();

    assert!(!outcome.cached);
    assert_eq!(outcome.entries_analyzed, 4);
    assert_eq!(backend.call_count(), 2);
}

#[test]
fn quota_failure_surfaces_as_error() {
    let conn = helpers::test_db();
    let now = Utc::now();
    for i in 1..=3 {
        helpers::seed_entry(&conn, "u1", &format!("p{i}"), "a", i, now);
    }

    let backend = ScriptedBackend::new(vec![Err(ProviderError(
        "429 quota exceeded for project".to_string(),
    ))]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());

    let err = analyze(
        &conn,
        &client,
        &AnalysisConfig::default(),
        "u1",
        &params(),
        now,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::QuotaExceeded));
    // Fatal on first attempt, no retries.
    assert_eq!(backend.call_count(), 1);
}

#[test]
fn exhausted_transient_failures_fall_back_and_skip_the_cache() {
    let conn = helpers::test_db();
    let now = Utc::now();
    for i in 1..=3 {
        helpers::seed_entry(&conn, "u1", &format!("p{i}"), "a", i, now);
    }

    let failing = ScriptedBackend::new(vec![
        Err(ProviderError("connection reset".to_string())),
        Err(ProviderError("connection reset".to_string())),
        Err(ProviderError("connection reset".to_string())),
    ]);
    let client = ResilientAiClient::new(&failing, &AiConfig::default());
    let config = AnalysisConfig::default();

    let outcome = analyze(&conn, &client, &config, "u1", &params(), now).unwrap();
    assert_eq!(outcome.results, fallback_report());
    assert_eq!(failing.call_count(), 3);

    // The fallback was not memoized: a healthy provider is consulted next.
    let healthy = ScriptedBackend::new(vec![Ok(GenerateOutcome::Text(REPORT_JSON.to_string()))]);
    let client = ResilientAiClient::new(&healthy, &AiConfig::default());
    let outcome = analyze(&conn, &client, &config, "u1", &params(), now).unwrap();
    assert!(!outcome.cached);
    assert_eq!(
        outcome.results.patterns,
        vec!["You write most in the morning"]
    );
}

#[test]
fn parameter_bounds_are_validated() {
    let conn = helpers::test_db();
    let backend = ScriptedBackend::reply("unused");
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    let config = AnalysisConfig::default();
    let now = Utc::now();

    let mut p = params();
    p.days = 0;
    assert!(matches!(
        analyze(&conn, &client, &config, "u1", &p, now),
        Err(CoreError::Validation(_))
    ));

    let mut p = params();
    p.max_entries = 51;
    assert!(matches!(
        analyze(&conn, &client, &config, "u1", &p, now),
        Err(CoreError::Validation(_))
    ));
}

#[test]
fn trends_count_modalities_and_days() {
    let conn = helpers::test_db();
    let now = Utc::now();
    helpers::seed_entry(&conn, "u1", "p1", "a", 1, now);
    helpers::seed_entry(&conn, "u1", "p2", "a", 1, now);
    helpers::seed_entry(&conn, "u1", "p3", "a", 3, now);
    conn.execute(
        "INSERT INTO entries (id, user_id, prompt, answer, modality, created_at, updated_at) \
         VALUES (?1, 'u1', 'photo', 'ocr text', 'image', ?2, ?2)",
        params![uuid::Uuid::now_v7().to_string(), now.to_rfc3339()],
    )
    .unwrap();

    let trends = mood_trends(&conn, "u1", 30, now).unwrap();
    assert_eq!(trends.total_entries, 4);
    assert_eq!(trends.entries_by_modality.get("text"), Some(&3));
    assert_eq!(trends.entries_by_modality.get("image"), Some(&1));
    assert_eq!(trends.active_days, 3);
    assert_eq!(
        trends.daily_activity.iter().map(|d| d.entries).sum::<u32>(),
        4
    );
    assert_eq!(trends.date_range.days, 30);
}

#[test]
fn trends_exclude_soft_deleted_and_out_of_window() {
    let conn = helpers::test_db();
    let now = Utc::now();
    helpers::seed_entry(&conn, "u1", "kept", "a", 1, now);
    let dropped = helpers::seed_entry(&conn, "u1", "dropped", "a", 2, now);
    helpers::seed_entry(&conn, "u1", "old", "a", 40, now);
    conn.execute(
        "UPDATE entries SET deleted_at = ?1 WHERE id = ?2",
        params![now.to_rfc3339(), dropped],
    )
    .unwrap();

    let trends = mood_trends(&conn, "u1", 30, now).unwrap();
    assert_eq!(trends.total_entries, 1);
    assert_eq!(trends.daily_activity.len(), 1);
}

#[test]
fn summary_reports_streaks_and_most_active_weekday() {
    let mut conn = helpers::test_db();
    let now = Utc::now();
    daybook::journal::entries::create_entry(
        &mut conn,
        "u1",
        daybook::journal::entries::NewEntry {
            prompt: "today".to_string(),
            answer: "words".to_string(),
            modality: daybook::journal::types::Modality::Text,
            tag: None,
        },
        now,
    )
    .unwrap();
    helpers::seed_entry(&conn, "u1", "also today", "a", 0, now);
    helpers::seed_entry(&conn, "u1", "yesterday", "a", 1, now);

    let summary = summary(&conn, "u1", now).unwrap();
    assert_eq!(summary.total_entries, 3);
    assert_eq!(summary.current_streak, 1);
    assert_eq!(summary.entries_this_month, 3);
    assert_eq!(
        summary.most_active_day.as_deref(),
        Some(now.format("%A").to_string().as_str())
    );
    assert_eq!(summary.entries_by_day.values().sum::<u32>(), 3);
}

#[test]
fn summary_with_no_entries_is_zeroed() {
    let conn = helpers::test_db();
    let summary = summary(&conn, "u1", Utc::now()).unwrap();
    assert_eq!(summary.total_entries, 0);
    assert_eq!(summary.current_streak, 0);
    assert!(summary.most_active_day.is_none());
    assert!(summary.entries_by_day.is_empty());
}
