//! Embeddings module for semantic search
//!
//! Provides structural chunking and the embedding provider contract with its
//! hashing and HTTP implementations.

pub mod chunker;
pub mod http;
pub mod model;

pub use chunker::{Chunk, ChunkStats, ChunkerConfig, SectionChunker, UndersizedPolicy};
pub use http::{HttpEmbedder, HttpEmbedderConfig};
pub use model::{build_embedder, l2_normalize, Embedder, HashingEmbedder};

#[cfg(test)]
pub use model::MockEmbedder;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;
