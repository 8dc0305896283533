//! Messages passed between the feeder, the embed workers and the collector

use crate::embeddings::EmbeddingError;

/// Chunk texts to embed; `offset` is the index position of the first one
#[derive(Debug)]
pub struct EmbedJob {
    pub offset: usize,
    pub texts: Vec<String>,
}

/// Worker output for one job
#[derive(Debug)]
pub enum BuildMessage {
    /// One vector per text of the job at `offset`
    Embedded {
        offset: usize,
        embeddings: Vec<Vec<f32>>,
    },

    /// Embedding failed for the job at `offset`
    Error { offset: usize, error: EmbeddingError },
}
