//! Vector index storage
//!
//! An in-memory flat inner-product index with positional text and metadata
//! stores, persisted as a directory of Parquet and JSON artifacts.

pub mod index;
pub mod manifest;
pub mod persist;

pub use index::{IndexStats, SearchHit, VectorIndex};
pub use manifest::IndexManifest;
pub use persist::{CHUNKS_FILE, MANIFEST_FILE, METADATA_FILE, VECTORS_FILE};

use crate::embeddings::EmbeddingError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Cannot build an index from zero chunks")]
    EmptyInput,

    #[error("Failed to persist index to {path}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    #[error("Index artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("Corrupt index at {path}: {reason}")]
    Corruption { path: PathBuf, reason: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;
