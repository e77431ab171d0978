//! Configuration settings for Creator Compass.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub llm: LlmSettings,
    pub outreach: OutreachSettings,
    pub cache: CacheSettings,
    pub batch: BatchSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files (extracted audio, segments).
    pub temp_dir: String,
    /// Directory where reports and transcripts are written.
    pub output_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.creator-compass".to_string(),
            temp_dir: "/tmp/creator-compass".to_string(),
            output_dir: "~/.creator-compass/outputs".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Language hint passed to the transcription API (ISO-639-1).
    pub language: Option<String>,
    /// Duration in seconds for splitting long audio files.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent chunk processing.
    pub max_concurrent_chunks: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            chunk_duration_seconds: 600,
            max_concurrent_chunks: 3,
        }
    }
}

/// LLM provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// DeepSeek chat API (OpenAI compatible).
    #[default]
    Deepseek,
    /// OpenAI chat API.
    Openai,
}

impl LlmProvider {
    /// Base URL used when no explicit `api_base` is configured.
    pub fn default_api_base(&self) -> &'static str {
        match self {
            LlmProvider::Deepseek => "https://api.deepseek.com",
            LlmProvider::Openai => "https://api.openai.com/v1",
        }
    }

    /// Environment variable conventionally holding this provider's key.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Deepseek => "DEEPSEEK_API_KEY",
            LlmProvider::Openai => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deepseek" => Ok(LlmProvider::Deepseek),
            "openai" => Ok(LlmProvider::Openai),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Deepseek => write!(f, "deepseek"),
            LlmProvider::Openai => write!(f, "openai"),
        }
    }
}

/// Chat model settings for content analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider (deepseek, openai).
    pub provider: LlmProvider,
    /// Chat model name.
    pub model: String,
    /// Override for the provider base URL.
    pub api_base: Option<String>,
    /// Environment variable the API key is read from (provider default if unset).
    pub api_key_env: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the completion.
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: "deepseek-chat".to_string(),
            api_base: None,
            api_key_env: None,
            temperature: 0.3,
            max_tokens: 4000,
        }
    }
}

impl LlmSettings {
    /// Base URL to send chat requests to.
    pub fn resolved_api_base(&self) -> String {
        self.api_base
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| self.provider.default_api_base().to_string())
    }

    /// Environment variable to read the API key from.
    pub fn resolved_api_key_env(&self) -> String {
        self.api_key_env
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.provider.default_api_key_env().to_string())
    }
}

/// Settings for the outreach script invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutreachSettings {
    /// Sender identity token that every outreach script must contain.
    pub sender_identity: String,
    /// The three methodology concepts: trust hook, empathy anchor, value map.
    pub methodology_terms: [String; 3],
    /// Literal fragments that must never reach a final script.
    pub denylist: Vec<String>,
}

impl Default for OutreachSettings {
    fn default() -> Self {
        Self {
            sender_identity: "LMW".to_string(),
            methodology_terms: [
                "trust hook".to_string(),
                "empathy anchor".to_string(),
                "value map".to_string(),
            ],
            denylist: super::prompts::EXAMPLE_SCRIPT_FRAGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Transcript cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Consult and populate the transcript cache.
    pub enabled: bool,
    /// Cache directory. Defaults to `<data_dir>/cache/transcripts`.
    pub dir: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// Batch driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Pause between creator jobs, as a courtesy to the upstream APIs.
    pub delay_seconds: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { delay_seconds: 5 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CompassError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("creator-compass")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded report output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Directory where saved transcripts are written.
    pub fn transcripts_dir(&self) -> PathBuf {
        self.output_dir().join("transcripts")
    }

    /// Get the expanded transcript cache directory path.
    pub fn cache_dir(&self) -> PathBuf {
        match &self.cache.dir {
            Some(dir) => Self::expand_path(dir),
            None => self.data_dir().join("cache").join("transcripts"),
        }
    }
}
