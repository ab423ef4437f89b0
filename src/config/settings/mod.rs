
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::embeddings::chunking::ChunkingConfig;

pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1536;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            embeddings: EmbeddingsConfig::default(),
            database: DatabaseConfig::default(),
            chunking: ChunkingConfig::default(),
            search: SearchConfig::default(),
            base_dir: PathBuf::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// Base URL of an OpenAI-compatible API, without the trailing route
    pub endpoint: String,
    pub model: String,
    pub batch_size: u32,
    pub dimension: u32,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for EmbeddingsConfig {
    #[inline]
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            batch_size: 64,
            dimension: DEFAULT_EMBEDDING_DIMENSION,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    #[inline]
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/knowledge_base".to_string(),
        }
    }
}

/// Retrieval policy knobs. These are deliberate constants, not values
/// tuned per query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Default result cap for direct searches
    pub default_limit: usize,
    /// Default similarity floor for direct searches
    pub default_threshold: f32,
    /// Similarity floor for the orchestrator's first semantic pass
    pub lenient_threshold: f32,
    /// Similarity floor for the orchestrator's last-resort semantic pass
    pub relaxed_threshold: f32,
    /// Result cap for the orchestrator's semantic passes
    pub semantic_limit: usize,
    /// Minimum intent score before keyword fallback is trusted
    pub intent_confidence: f32,
    /// Cap on intent keywords folded into one substring query
    pub max_intent_keywords: usize,
    /// Result cap for the intent keyword query
    pub intent_match_limit: usize,
}

impl Default for SearchConfig {
    #[inline]
    fn default() -> Self {
        Self {
            default_limit: 5,
            default_threshold: 0.5,
            lenient_threshold: 0.2,
            relaxed_threshold: 0.0,
            semantic_limit: 10,
            intent_confidence: 0.6,
            max_intent_keywords: 12,
            intent_match_limit: 50,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid API key variable name: {0} (cannot be empty)")]
    InvalidApiKeyEnv(String),
    #[error("Invalid database URL: {0} (must be a postgres:// URL)")]
    InvalidDatabaseUrl(String),
    #[error("Invalid chunk size: {0} (must be between 1 and 8192)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid similarity threshold: {0} (must be between -1 and 1)")]
    InvalidThreshold(f32),
    #[error("Invalid intent confidence: {0} (must be between 0 and 1)")]
    InvalidConfidence(f32),
    #[error("Invalid result limit: {0} (must be at least 1)")]
    InvalidLimit(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from `<config_dir>/config.toml`, falling back to
    /// defaults when no file exists yet.
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                embeddings: EmbeddingsConfig::default(),
                database: DatabaseConfig::default(),
                chunking: ChunkingConfig::default(),
                search: SearchConfig::default(),
                base_dir: config_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Load configuration from the platform config directory.
    #[inline]
    pub fn load_default() -> Result<Self> {
        let config_dir = crate::config::get_config_dir()?;
        Self::load(config_dir)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.base_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.embeddings.validate()?;
        self.validate_database()?;
        self.validate_chunking()?;
        self.validate_search()?;
        Ok(())
    }

    fn validate_database(&self) -> Result<(), ConfigError> {
        let url = &self.database.url;
        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(ConfigError::InvalidDatabaseUrl(url.clone()));
        }
        Url::parse(url).map_err(|_| ConfigError::InvalidDatabaseUrl(url.clone()))?;
        Ok(())
    }

    fn validate_chunking(&self) -> Result<(), ConfigError> {
        let config = &self.chunking;

        if config.chunk_size == 0 || config.chunk_size > 8192 {
            return Err(ConfigError::InvalidChunkSize(config.chunk_size));
        }

        if config.chunk_overlap >= config.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                config.chunk_overlap,
                config.chunk_size,
            ));
        }

        Ok(())
    }

    fn validate_search(&self) -> Result<(), ConfigError> {
        let config = &self.search;

        for threshold in [
            config.default_threshold,
            config.lenient_threshold,
            config.relaxed_threshold,
        ] {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(ConfigError::InvalidThreshold(threshold));
            }
        }

        if !(0.0..=1.0).contains(&config.intent_confidence) {
            return Err(ConfigError::InvalidConfidence(config.intent_confidence));
        }

        for limit in [
            config.default_limit,
            config.semantic_limit,
            config.max_intent_keywords,
            config.intent_match_limit,
        ] {
            if limit == 0 {
                return Err(ConfigError::InvalidLimit(limit));
            }
        }

        Ok(())
    }
}

impl EmbeddingsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(64..=4096).contains(&self.dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(self.dimension));
        }

        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::InvalidApiKeyEnv(self.api_key_env.clone()));
        }

        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.endpoint).map_err(|_| ConfigError::InvalidEndpoint(self.endpoint.clone()))
    }
}
