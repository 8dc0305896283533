//! Parallel index build
//!
//! Chunk texts are embedded on a pool of worker threads connected by bounded
//! crossbeam channels:
//! 1. Feed - split the chunks into positioned batches
//! 2. Embed - call the embedder for each batch
//! 3. Collect - place vectors back by position and finalize the index
//!
//! The result is identical to [`VectorIndex::build`] with the same embedder.

pub mod config;
pub mod messages;
pub mod stages;

pub use config::PipelineConfig;
pub use messages::{BuildMessage, EmbedJob};

use crate::embeddings::{Chunk, Embedder, EmbeddingError};
use crate::storage::{IndexError, VectorIndex};
use crossbeam_channel::bounded;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("No embedding produced for chunk at position {0}")]
    MissingEmbedding(usize),

    #[error("Thread join error")]
    ThreadJoin,
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Builds a [`VectorIndex`] with embedding spread across worker threads
pub struct ParallelIndexBuilder {
    config: PipelineConfig,
}

impl ParallelIndexBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Embed `chunks` in parallel and build the index
    ///
    /// If any batch fails, the error of the lowest-positioned failing batch is
    /// returned and no index is built.
    pub fn build(&self, chunks: &[Chunk], embedder: Arc<dyn Embedder>) -> Result<VectorIndex> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyInput.into());
        }

        let batch_size = self.config.batch_size.max(1);
        let workers = self.config.embed_workers.max(1);
        let capacity = self.config.channel_capacity.max(1);
        log::info!(
            "Embedding {} chunks on {} workers (batch size {})",
            chunks.len(),
            workers,
            batch_size
        );

        let jobs: Vec<EmbedJob> = chunks
            .chunks(batch_size)
            .enumerate()
            .map(|(i, batch)| EmbedJob {
                offset: i * batch_size,
                texts: batch.iter().map(|c| c.text.clone()).collect(),
            })
            .collect();

        let (job_tx, job_rx) = bounded::<EmbedJob>(capacity);
        let (result_tx, result_rx) = bounded::<BuildMessage>(capacity);

        let mut handles: Vec<JoinHandle<Result<()>>> = Vec::new();

        // Stage 1: feeder owns the only job sender
        handles.push(thread::spawn(move || stages::feed_worker(jobs, job_tx)));

        // Stage 2: embed workers
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = result_tx.clone();
            let emb = embedder.clone();

            handles.push(thread::spawn(move || stages::embed_worker(rx, tx, emb)));
        }
        // Drop our copies so the result channel closes when workers finish
        drop(job_rx);
        drop(result_tx);

        // Stage 3: collect by position
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; chunks.len()];
        let mut first_error: Option<(usize, EmbeddingError)> = None;
        for msg in result_rx {
            match msg {
                BuildMessage::Embedded { offset, embeddings } => {
                    for (i, embedding) in embeddings.into_iter().enumerate() {
                        if let Some(slot) = slots.get_mut(offset + i) {
                            *slot = Some(embedding);
                        }
                    }
                }
                BuildMessage::Error { offset, error } => {
                    log::warn!("Embedding batch at offset {} failed: {}", offset, error);
                    if first_error.as_ref().map_or(true, |(seen, _)| offset < *seen) {
                        first_error = Some((offset, error));
                    }
                }
            }
        }

        // Wait for all workers to finish
        for handle in handles {
            handle.join().map_err(|_| PipelineError::ThreadJoin)??;
        }

        if let Some((_, error)) = first_error {
            return Err(error.into());
        }

        let embeddings = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or(PipelineError::MissingEmbedding(i)))
            .collect::<Result<Vec<_>>>()?;

        Ok(VectorIndex::from_embeddings(
            chunks,
            embeddings,
            embedder.model_id(),
        )?)
    }
}
