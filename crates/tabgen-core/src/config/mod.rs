//! Configuration management for tabgen.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `tabgen.toml` file
//! 3. User config `~/.config/tabgen/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Name of the project-local config file.
pub const PROJECT_CONFIG_FILE: &str = "tabgen.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse schema file: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model collaborator configuration.
    pub llm: LLMConfig,

    /// Batch generation configuration.
    pub generation: GenerationConfig,

    /// CSV export configuration.
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./tabgen.toml` (project local)
    /// 2. `~/.config/tabgen/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides are applied in every case.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(PROJECT_CONFIG_FILE).exists() {
            return Self::from_file(PROJECT_CONFIG_FILE);
        }

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Self::from_defaults()
    }

    /// Built-in defaults with environment overrides applied.
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::default().finish()
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.finish()
    }

    fn finish(mut self) -> Result<Self, ConfigError> {
        self.apply_env_overrides();
        self.validate()?;
        Ok(self)
    }

    /// Location of the per-user config file, if a config dir exists.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tabgen").join("config.toml"))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("TABGEN_MODEL") {
            self.llm.model = Some(model);
        }
        if let Ok(url) = std::env::var("TABGEN_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("TABGEN_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(grounding) = std::env::var("TABGEN_SEARCH_GROUNDING") {
            if let Ok(flag) = grounding.parse() {
                self.llm.search_grounding = flag;
            }
        }
        if let Ok(rows) = std::env::var("TABGEN_ROW_COUNT") {
            if let Ok(n) = rows.parse() {
                self.generation.default_row_count = n;
            }
        }
        if let Ok(dir) = std::env::var("TABGEN_OUTPUT_DIR") {
            self.export.output_dir = dir;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.default_row_count == 0 {
            return Err(ConfigError::Invalid(
                "generation.default_row_count must be at least 1".to_string(),
            ));
        }
        if self.generation.default_batches == 0 {
            return Err(ConfigError::Invalid(
                "generation.default_batches must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Render this configuration as TOML. The API key is never included.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Model collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Gemini model identifier.
    pub model: Option<String>,

    /// Base URL for the Generative Language API.
    pub base_url: Option<String>,

    /// API key (can also be set via environment variable).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Whether requests declare the Google Search grounding tool.
    pub search_grounding: bool,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: None,
            base_url: None,
            api_key: None,
            search_grounding: DEFAULT_SEARCH_GROUNDING,
        }
    }
}

impl LLMConfig {
    /// Get the model name, falling back to the default.
    pub fn model_or_default(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string())
    }

    /// Get the base URL, falling back to the default.
    pub fn base_url_or_default(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string())
    }

    /// Get API key from config or environment.
    pub fn api_key_or_env(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("TABGEN_API_KEY").ok())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Batch generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Rows requested per batch when the schema does not say.
    pub default_row_count: u32,

    /// Batches run per `generate` invocation.
    pub default_batches: u32,

    /// Trailing rows quoted back to the model as a duplicate-avoidance hint.
    pub duplicate_sample_size: usize,

    /// Rows shown in the terminal preview.
    pub preview_rows: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_row_count: DEFAULT_ROW_COUNT,
            default_batches: DEFAULT_BATCHES,
            duplicate_sample_size: DEFAULT_DUPLICATE_SAMPLE_SIZE,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

/// CSV export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory exported files land in.
    pub output_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

impl ExportConfig {
    /// Full path for an export file name.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        PathBuf::from(&self.output_dir).join(file_name)
    }
}
