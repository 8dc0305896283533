//! Pipeline configuration

use serde::{Deserialize, Serialize};

/// Configuration for the parallel index build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of embedding worker threads
    pub embed_workers: usize,
    /// Channel buffer capacity
    pub channel_capacity: usize,
    /// Chunks sent to the embedder per call
    pub batch_size: usize,
}

impl PipelineConfig {
    /// Create a config with the worker count based on CPU count
    pub fn new() -> Self {
        Self {
            embed_workers: (num_cpus::get() / 2).max(1),
            channel_capacity: 100,
            batch_size: 16,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_workers() {
        let config = PipelineConfig::new();

        assert!(config.embed_workers >= 1);
        assert!(config.channel_capacity >= 1);
        assert!(config.batch_size >= 1);
    }

    #[test]
    fn test_config_from_toml() {
        let config: PipelineConfig = toml::from_str("embed_workers = 3").unwrap();

        assert_eq!(config.embed_workers, 3);
        assert_eq!(config.batch_size, 16);
    }
}
