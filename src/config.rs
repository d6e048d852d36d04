use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DaybookConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    pub context: ContextConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AiConfig {
    pub model: String,
    /// Environment variable holding the provider API key. The key itself is
    /// never written to the config file.
    pub api_key_env: String,
    pub retries: u32,
    pub chat_temperature: f32,
    pub analysis_temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub request_timeout_secs: u64,
}

/// Bounds on the journal primer injected into new conversations.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ContextConfig {
    pub max_entries: usize,
    pub window_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub default_days: u32,
    pub default_max_entries: u32,
    /// Below this entry count the service returns canned encouragement
    /// instead of calling the AI provider.
    pub min_entries: usize,
    pub cache_ttl_secs: i64,
}

impl Default for DaybookConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            ai: AiConfig::default(),
            context: ContextConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_daybook_dir()
            .join("daybook.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".into(),
            api_key_env: "GEMINI_API_KEY".into(),
            retries: 2,
            chat_temperature: 0.7,
            analysis_temperature: 0.3,
            max_output_tokens: 1024,
            top_p: 0.8,
            request_timeout_secs: 30,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_entries: 5,
            window_days: 30,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_days: 30,
            default_max_entries: 25,
            min_entries: 3,
            cache_ttl_secs: 3600,
        }
    }
}

/// Returns `~/.daybook/`
pub fn default_daybook_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".daybook")
}

/// Returns the default config file path: `~/.daybook/config.toml`
pub fn default_config_path() -> PathBuf {
    default_daybook_dir().join("config.toml")
}

impl DaybookConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            DaybookConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (DAYBOOK_DB, DAYBOOK_LOG_LEVEL,
    /// DAYBOOK_AI_MODEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DAYBOOK_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("DAYBOOK_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("DAYBOOK_AI_MODEL") {
            self.ai.model = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
