//! Configuration types for gptbot
//!
//! Two sources feed the bot: a YAML file describing the language model and
//! its system prompt, and process environment variables carrying secrets
//! and paths.

use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::telegram::AccessList;

// ─────────────────────────────────────────────────────────────────────────────
// Model Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Model name used when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// System prompt used when the configuration does not provide one.
pub const DEFAULT_PROMPT: &str = "Summarize the following text.";

/// Completion parameters. Unset values are left to the provider's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            max_completion_tokens: None,
            temperature: None,
            top_p: None,
            n: None,
            presence_penalty: None,
            seed: None,
            frequency_penalty: None,
            service_tier: None,
            verbosity: None,
        }
    }
}

impl ModelConfig {
    /// Maximum sampling temperature.
    pub const MAX_TEMPERATURE: f32 = 2.0;
    /// Bound for presence and frequency penalties, in both directions.
    pub const MAX_PENALTY: f32 = 2.0;

    /// Clamp parameters to the ranges the completion API accepts and unset
    /// the ones that carry no value.
    pub fn sanitize(&mut self) {
        if self.name.trim().is_empty() {
            warn!("Model name is empty, using {}", DEFAULT_MODEL);
            self.name = DEFAULT_MODEL.to_string();
        }

        self.temperature = self
            .temperature
            .map(|t| t.clamp(0.0, Self::MAX_TEMPERATURE));
        self.top_p = self.top_p.map(|p| p.clamp(0.0, 1.0));
        self.presence_penalty = self
            .presence_penalty
            .map(|p| p.clamp(-Self::MAX_PENALTY, Self::MAX_PENALTY));
        self.frequency_penalty = self
            .frequency_penalty
            .map(|p| p.clamp(-Self::MAX_PENALTY, Self::MAX_PENALTY));

        // Zero and empty mean "not set"
        self.max_completion_tokens = self.max_completion_tokens.filter(|&t| t > 0);
        self.n = self.n.filter(|&n| n > 0);
        self.service_tier = self.service_tier.take().filter(|s| !s.trim().is_empty());
        self.verbosity = self.verbosity.take().filter(|s| !s.trim().is_empty());
    }
}

/// The model file: which model to call and the system prompt to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GptConfig {
    pub model: ModelConfig,
    pub prompt: String,
}

impl Default for GptConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                temperature: Some(0.9),
                ..ModelConfig::default()
            },
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl GptConfig {
    pub fn sanitize(&mut self) {
        self.model.sanitize();
        if self.prompt.trim().is_empty() {
            self.prompt = DEFAULT_PROMPT.to_string();
        }
    }

    /// Deserialize from YAML and sanitize the result.
    pub fn from_yaml_sanitized(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.sanitize();
        Ok(config)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Application directory under the platform data dir.
const APP_NAME: &str = "gptbot";

/// Default conversation log file name.
const STORAGE_FILE_NAME: &str = "storage.yaml";

/// Model configuration path used when `CONFIG_PATH` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "./conf/gpt.yaml";

pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_OPENAI_TOKEN: &str = "OPENAI_TOKEN";
pub const ENV_ACCESS: &str = "TELEGRAM_BOT_ACCESS";
pub const ENV_STORAGE_PATH: &str = "STORAGE_PATH";
pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";

/// Settings taken from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSettings {
    pub telegram_token: Option<String>,
    pub openai_token: Option<String>,
    /// Raw access list, see [`AccessList::parse`].
    pub access: String,
    pub storage_path: PathBuf,
    pub config_path: PathBuf,
}

impl EnvSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    ///
    /// ```ignore
    /// let settings = EnvSettings::from_lookup(|key| match key {
    ///     "TELEGRAM_BOT_ACCESS" => Some("@alice".to_string()),
    ///     _ => None,
    /// });
    /// assert!(settings.access_list().is_allowed(0, "alice"));
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            telegram_token: get(ENV_TELEGRAM_TOKEN),
            openai_token: get(ENV_OPENAI_TOKEN),
            access: get(ENV_ACCESS).unwrap_or_default(),
            storage_path: get(ENV_STORAGE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(default_storage_path),
            config_path: PathBuf::from(
                get(ENV_CONFIG_PATH).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
            ),
        }
    }

    pub fn access_list(&self) -> AccessList {
        AccessList::parse(&self.access)
    }
}

/// `<data dir>/gptbot/storage.yaml`, or `storage.yaml` in the working
/// directory when the platform has no data dir.
pub fn default_storage_path() -> PathBuf {
    match dirs::data_dir() {
        Some(base) => base.join(APP_NAME).join(STORAGE_FILE_NAME),
        None => {
            warn!("No platform data directory, keeping conversations in the working directory");
            PathBuf::from(STORAGE_FILE_NAME)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
