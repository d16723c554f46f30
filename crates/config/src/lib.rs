//! Configuration loading and validation for Mordomo.
//!
//! Loads configuration from `~/.mordomo/config.toml` with environment
//! variable overrides for the credentials:
//!
//! - `TELEGRAM_TOKEN` — bot token from @BotFather
//! - `GOOGLE_API_KEY` — Gemini API key
//! - `TAVILY_API_KEY` — web search key (optional; search tool is skipped
//!   without it)
//!
//! Missing required credentials are a fatal startup error — the bot refuses
//! to start rather than limping along half-configured.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default persona instruction.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "Você é 'Mordomo', uma figura paterna e mentor. \
Trate o usuário como 'Senhor' ou 'Senhora', com cortesia impecável e respostas diretas. \
Use as ferramentas disponíveis quando a pergunta exigir informações atuais, \
geração de documentos ou anotações persistentes.";

/// The root configuration structure.
///
/// Maps directly to `~/.mordomo/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telegram bot token. Overridden by `TELEGRAM_TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_token: Option<String>,

    /// Gemini API key. Overridden by `GOOGLE_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_api_key: Option<String>,

    /// Tavily API key. Overridden by `TAVILY_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tavily_api_key: Option<String>,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tool round-trips per user turn before failing closed.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// System instruction override (defaults to the Mordomo persona).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// Allowlist of Telegram sender ids. Empty = deny all, ["*"] = allow all.
    #[serde(default = "default_allowed_users")]
    pub allowed_users: Vec<String>,

    /// Where generated documents land before delivery. Defaults to the
    /// system temp directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Note store file. Defaults to `~/.mordomo/notas.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_path: Option<PathBuf>,
}

fn default_model() -> String {
    "gemini-pro-latest".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tool_rounds() -> u32 {
    8
}
fn default_allowed_users() -> Vec<String> {
    vec!["*".into()]
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("telegram_token", &redact(&self.telegram_token))
            .field("google_api_key", &redact(&self.google_api_key))
            .field("tavily_api_key", &redact(&self.tavily_api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("allowed_users", &self.allowed_users)
            .field("output_dir", &self.output_dir)
            .field("notes_path", &self.notes_path)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.mordomo/config.toml),
    /// then apply environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(token) = std::env::var("TELEGRAM_TOKEN") {
            config.telegram_token = Some(token);
        }
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            config.google_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("TAVILY_API_KEY") {
            config.tavily_api_key = Some(key);
        }
        if let Ok(model) = std::env::var("MORDOMO_MODEL") {
            config.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".mordomo")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "max_tool_rounds must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The Telegram token, required for anything that touches the platform.
    pub fn telegram_token(&self) -> Result<&str, ConfigError> {
        self.telegram_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential("TELEGRAM_TOKEN".into()))
    }

    /// The Gemini key, required to talk to the model at all.
    pub fn google_api_key(&self) -> Result<&str, ConfigError> {
        self.google_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential("GOOGLE_API_KEY".into()))
    }

    /// The effective system instruction.
    pub fn system_instruction(&self) -> &str {
        self.system_instruction
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
    }

    /// Where generated documents are written.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Where the note store lives.
    pub fn notes_path(&self) -> PathBuf {
        self.notes_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("notas.json"))
    }

    /// Generate a default config TOML string (for `onboard`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            google_api_key: None,
            tavily_api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tool_rounds: default_max_tool_rounds(),
            system_instruction: None,
            allowed_users: default_allowed_users(),
            output_dir: None,
            notes_path: None,
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors. All fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required credential: {0}")]
    MissingCredential(String),
}
