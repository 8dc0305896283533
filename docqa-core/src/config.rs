//! Settings for chunking, embedding, retrieval and the build pipeline
//!
//! Every field has a default, so an empty TOML file is a valid configuration.

use crate::document::ParserConfig;
use crate::embeddings::{ChunkerConfig, HttpEmbedderConfig};
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Which embedding provider to construct
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    #[default]
    Hashing,
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Vector dimension for the hashing provider
    pub dimension: usize,
    pub http: HttpEmbedderConfig,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            dimension: 384,
            http: HttpEmbedderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub min_score: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 8,
            min_score: 0.3,
        }
    }
}

/// Top-level settings, one section per concern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkerConfig,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub pipeline: PipelineConfig,
    pub parser: ParserConfig,
}

impl Settings {
    /// Read and validate settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_toml(&text)?;
        log::debug!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Load from the given file, or fall back to defaults when there is none
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be at least 1".to_string()));
        }
        if !self.retrieval.min_score.is_finite() {
            return Err(ConfigError::Invalid("min_score must be finite".to_string()));
        }

        match self.embedding.provider {
            EmbeddingProvider::Hashing if self.embedding.dimension == 0 => {
                return Err(ConfigError::Invalid(
                    "embedding dimension must be greater than zero".to_string(),
                ));
            }
            EmbeddingProvider::Http
                if self.embedding.http.base_url.trim().is_empty()
                    || self.embedding.http.model.trim().is_empty() =>
            {
                return Err(ConfigError::Invalid(
                    "http provider needs base_url and model".to_string(),
                ));
            }
            _ => {}
        }

        Ok(())
    }
}
