use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// Environment variables checked for the Gemini key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Reader configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReaderConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub text_model: String,
    pub speech_model: String,
    pub voice_name: String,
    pub speech_sample_rate: u32,
    /// Language the readings and the reflection are requested in
    pub reading_language: String,
    /// Spoken before the gospel; `{reference}` is replaced with the gospel reference
    pub gospel_intro: String,
    pub default_volume: f32,
    pub preferred_device: Option<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            text_model: "gemini-2.5-flash".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice_name: "Kore".to_string(),
            speech_sample_rate: 24_000,
            reading_language: "French".to_string(),
            gospel_intro: "Évangile de Jésus Christ selon {reference}.".to_string(),
            default_volume: 0.8,
            preferred_device: None,
        }
    }
}

impl ReaderConfig {
    /// Resolve the API key: environment first, then the config file
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        Self::resolve_api_key_with(self.api_key.as_deref(), |name| std::env::var(name).ok())
    }

    fn resolve_api_key_with<F>(configured: Option<&str>, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .chain(configured.map(str::to_string))
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    config: ReaderConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Load from the default location, creating the directory if needed
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        Self::with_path(config_path)
    }

    /// Load from an explicit path; a missing file yields defaults
    pub fn with_path(config_path: PathBuf) -> Result<Self, ConfigError> {
        let config = Self::load_config(&config_path)?;
        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn get_config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn update_config<F>(&mut self, updater: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut ReaderConfig),
    {
        updater(&mut self.config);
        self.save_config()
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), ConfigError> {
        self.config.default_volume = volume.clamp(0.0, 1.0);
        self.save_config()
    }

    fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::home_dir()
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join(".config")
            .join("liturgy-reader");

        std::fs::create_dir_all(&config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    fn load_config(path: &Path) -> Result<ReaderConfig, ConfigError> {
        if !path.exists() {
            return Ok(ReaderConfig::default());
        }

        let config_content = std::fs::read_to_string(path)?;
        let config: ReaderConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    fn save_config(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let config_content = toml::to_string_pretty(&self.config)?;
        std::fs::write(&self.config_path, config_content)?;

        Ok(())
    }
}
