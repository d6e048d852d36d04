mod helpers;

use daybook::ai::client::{
    ResilientAiClient, REPLY_HIGH_DEMAND, REPLY_NO_CONTENT, REPLY_REPHRASE, REPLY_SAFETY_BLOCKED,
    REPLY_SAFETY_GUIDELINES, REPLY_TECHNICAL,
};
use daybook::ai::{GenerateOutcome, ProviderError};
use daybook::chat::codec::Turn;
use daybook::config::AiConfig;

use helpers::ScriptedBackend;

fn turns() -> Vec<Turn> {
    vec![Turn::user("hello")]
}

#[test]
fn successful_reply_is_trimmed() {
    let backend = ScriptedBackend::new(vec![Ok(GenerateOutcome::Text(
        "  a warm reply  ".to_string(),
    ))]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    assert_eq!(client.chat_reply(&turns()), "a warm reply");
    assert_eq!(backend.call_count(), 1);
}

#[test]
fn whitespace_only_reply_asks_for_a_rephrase() {
    let backend = ScriptedBackend::new(vec![Ok(GenerateOutcome::Text("   ".to_string()))]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    assert_eq!(client.chat_reply(&turns()), REPLY_REPHRASE);
}

#[test]
fn safety_blocked_response_is_a_fixed_message_not_an_error() {
    let backend = ScriptedBackend::new(vec![Ok(GenerateOutcome::SafetyBlocked)]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    assert_eq!(client.chat_reply(&turns()), REPLY_SAFETY_BLOCKED);
    assert_eq!(backend.call_count(), 1);
}

#[test]
fn empty_content_retries_then_gives_fixed_message() {
    let backend = ScriptedBackend::new(vec![
        Ok(GenerateOutcome::NoContent),
        Ok(GenerateOutcome::NoContent),
        Ok(GenerateOutcome::NoContent),
    ]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    assert_eq!(client.chat_reply(&turns()), REPLY_NO_CONTENT);
    assert_eq!(backend.call_count(), 3);
}

#[test]
fn empty_content_then_text_recovers() {
    let backend = ScriptedBackend::new(vec![
        Ok(GenerateOutcome::NoContent),
        Ok(GenerateOutcome::Text("second try".to_string())),
    ]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    assert_eq!(client.chat_reply(&turns()), "second try");
    assert_eq!(backend.call_count(), 2);
}

#[test]
fn quota_errors_are_fatal_on_first_attempt() {
    let backend = ScriptedBackend::new(vec![Err(ProviderError(
        "Resource exhausted: QUOTA".to_string(),
    ))]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    assert_eq!(client.chat_reply(&turns()), REPLY_HIGH_DEMAND);
    assert_eq!(backend.call_count(), 1);
}

#[test]
fn rate_limit_errors_count_as_quota() {
    let backend = ScriptedBackend::new(vec![Err(ProviderError(
        "HTTP 429: rate limit reached".to_string(),
    ))]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    assert_eq!(client.chat_reply(&turns()), REPLY_HIGH_DEMAND);
    assert_eq!(backend.call_count(), 1);
}

#[test]
fn safety_errors_are_fatal_on_first_attempt() {
    let backend = ScriptedBackend::new(vec![Err(ProviderError(
        "request blocked by safety policy".to_string(),
    ))]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    assert_eq!(client.chat_reply(&turns()), REPLY_SAFETY_GUIDELINES);
    assert_eq!(backend.call_count(), 1);
}

#[test]
fn transient_errors_retry_then_recover() {
    let backend = ScriptedBackend::new(vec![
        Err(ProviderError("connection reset".to_string())),
        Ok(GenerateOutcome::Text("back online".to_string())),
    ]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    assert_eq!(client.chat_reply(&turns()), "back online");
    assert_eq!(backend.call_count(), 2);
}

#[test]
fn exhausted_transient_errors_give_technical_message() {
    let backend = ScriptedBackend::new(vec![
        Err(ProviderError("timeout".to_string())),
        Err(ProviderError("timeout".to_string())),
        Err(ProviderError("timeout".to_string())),
    ]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    assert_eq!(client.chat_reply(&turns()), REPLY_TECHNICAL);
    assert_eq!(backend.call_count(), 3);
}

#[test]
fn retry_budget_follows_config() {
    let mut config = AiConfig::default();
    config.retries = 0;
    let backend = ScriptedBackend::new(vec![Err(ProviderError("timeout".to_string()))]);
    let client = ResilientAiClient::new(&backend, &config);
    assert_eq!(client.chat_reply(&turns()), REPLY_TECHNICAL);
    assert_eq!(backend.call_count(), 1);
}

#[test]
fn analysis_retries_on_unparseable_json_then_falls_back() {
    let backend = ScriptedBackend::new(vec![
        Ok(GenerateOutcome::Text("not json at all".to_string())),
        Ok(GenerateOutcome::Text("still not json".to_string())),
        Ok(GenerateOutcome::Text("{broken".to_string())),
    ]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    let report = client.analyze("analyze this").unwrap();
    assert_eq!(report, daybook::ai::validate::fallback_report());
    assert_eq!(backend.call_count(), 3);
}

#[test]
fn analysis_parse_failure_then_valid_json_recovers() {
    let backend = ScriptedBackend::new(vec![
        Ok(GenerateOutcome::Text("oops".to_string())),
        Ok(GenerateOutcome::Text(
            r#"{"patterns":["p"],"insights":["i"],"suggested_prompts":["s"]}"#.to_string(),
        )),
    ]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    let report = client.analyze("analyze this").unwrap();
    assert_eq!(report.patterns, vec!["p"]);
    assert_eq!(backend.call_count(), 2);
}

#[test]
fn analysis_safety_error_falls_back_instead_of_failing() {
    let backend = ScriptedBackend::new(vec![Err(ProviderError(
        "blocked by safety filters".to_string(),
    ))]);
    let client = ResilientAiClient::new(&backend, &AiConfig::default());
    let report = client.analyze("analyze this").unwrap();
    assert_eq!(report, daybook::ai::validate::fallback_report());
    assert_eq!(backend.call_count(), 1);
}
