//! Application configuration
//!
//! Loaded from environment variables, then adjusted with builder-style
//! overrides (the CLI applies its flags this way):
//!
//! ```ignore
//! let config = AppConfig::from_env()?
//!     .with_data_dir("/tmp/viveka")
//!     .with_offline(true);
//! ```

use std::path::PathBuf;

use crate::core::{ChatError, ChatResult};
use crate::llm::gemini::DEFAULT_API_BASE;

/// Default model when `GEMINI_MODEL` is unset
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default directory for the persisted transcript
pub const DEFAULT_DATA_DIR: &str = ".viveka";

/// Gemini gateway settings
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key; only required when not running offline
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub api_base: String,
    /// Whole-request timeout, including the streamed body
    pub request_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 8192,
            temperature: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory for the rolling log file
    pub dir: PathBuf,
    /// Emit JSON lines instead of plain text
    pub json: bool,
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_DATA_DIR).join("logs"),
            json: false,
            default_filter: "viveka=info".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub log: LogConfig,
    /// Directory for the key-value store
    pub data_dir: PathBuf,
    /// Use the scripted gateway instead of Gemini
    pub offline: bool,
    /// Skip the login prompt with this display name
    pub display_name: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            log: LogConfig::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            offline: false,
            display_name: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads:
    /// - `GEMINI_API_KEY`
    /// - `GEMINI_MODEL` (defaults to gemini-2.5-flash)
    /// - `GEMINI_MAX_TOKENS` (defaults to 8192)
    /// - `GEMINI_TEMPERATURE`
    /// - `GEMINI_API_BASE`
    /// - `VIVEKA_DATA_DIR` (defaults to .viveka)
    /// - `VIVEKA_LOG_DIR` (defaults to <data dir>/logs)
    /// - `VIVEKA_LOG_JSON`
    pub fn from_env() -> ChatResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.gemini.api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());
        if let Some(model) = lookup("GEMINI_MODEL") {
            config.gemini.model = model;
        }
        if let Some(max_tokens) = lookup("GEMINI_MAX_TOKENS") {
            config.gemini.max_tokens = max_tokens.parse().map_err(|_| {
                ChatError::InvalidConfig(format!("GEMINI_MAX_TOKENS is not a number: {}", max_tokens))
            })?;
        }
        if let Some(temperature) = lookup("GEMINI_TEMPERATURE") {
            config.gemini.temperature = Some(temperature.parse().map_err(|_| {
                ChatError::InvalidConfig(format!("GEMINI_TEMPERATURE is not a number: {}", temperature))
            })?);
        }
        if let Some(api_base) = lookup("GEMINI_API_BASE") {
            config.gemini.api_base = api_base;
        }
        if let Some(dir) = lookup("VIVEKA_DATA_DIR") {
            config = config.with_data_dir(dir);
        }
        if let Some(dir) = lookup("VIVEKA_LOG_DIR") {
            config.log.dir = PathBuf::from(dir);
        }
        config.log.json = lookup("VIVEKA_LOG_JSON")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        config.validate()?;
        Ok(config)
    }

    /// Set the data directory; the log directory follows unless set separately
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if self.log.dir == self.data_dir.join("logs") {
            self.log.dir = dir.join("logs");
        }
        self.data_dir = dir;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.gemini.model = model.into();
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Check values that would only fail later at request time
    pub fn validate(&self) -> ChatResult<()> {
        if self.gemini.model.trim().is_empty() {
            return Err(ChatError::InvalidConfig("model name is empty".into()));
        }
        if self.gemini.max_tokens == 0 {
            return Err(ChatError::InvalidConfig("max tokens must be positive".into()));
        }
        if self.gemini.request_timeout_secs == 0 {
            return Err(ChatError::InvalidConfig("request timeout must be positive".into()));
        }
        Ok(())
    }
}
