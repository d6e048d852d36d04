//! Gemini `generateContent` backend over blocking HTTP.
//!
//! Implements [`GenerateContent`] for the production provider. Failed HTTP
//! responses carry the provider's body text back in [`ProviderError`] so the
//! client's classifier can see "quota"/"limit"/"safety" markers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ai::{GenerateContent, GenerateOptions, GenerateOutcome, ProviderError};
use crate::chat::codec::{Role, Turn};
use crate::config::AiConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client from config, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("{} environment variable not set", config.api_key_env))?;
        Self::new(api_key, &config.model, config.request_timeout_secs)
    }

    pub fn new(api_key: String, model: &str, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireSystemInstruction<'a>>,
}

#[derive(Serialize, Deserialize)]
struct WireContent {
    role: String,
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize)]
struct WirePart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
}

#[derive(Serialize)]
struct WireSystemInstruction<'a> {
    parts: Vec<WireSystemPart<'a>>,
}

#[derive(Serialize)]
struct WireSystemPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<WireContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

impl GenerateContent for GeminiClient {
    fn generate(
        &self,
        system: Option<&str>,
        turns: &[Turn],
        options: &GenerateOptions,
    ) -> Result<GenerateOutcome, ProviderError> {
        let request = GenerateRequest {
            contents: turns
                .iter()
                .map(|turn| WireContent {
                    role: role_name(turn.role).to_string(),
                    parts: turn
                        .parts
                        .iter()
                        .map(|text| WirePart { text: text.clone() })
                        .collect(),
                })
                .collect(),
            generation_config: WireGenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
                top_p: options.top_p,
            },
            system_instruction: system.map(|text| WireSystemInstruction {
                parts: vec![WireSystemPart { text }],
            }),
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .map_err(|err| ProviderError(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError(format!("HTTP {status}: {body}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|err| ProviderError(format!("unreadable response body: {err}")))?;

        if let Some(feedback) = parsed.prompt_feedback {
            if feedback.block_reason.is_some() {
                return Ok(GenerateOutcome::SafetyBlocked);
            }
        }

        let text = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Ok(GenerateOutcome::NoContent);
        }
        Ok(GenerateOutcome::Text(text))
    }
}
