//! Retrieval over a swappable index
//!
//! Readers take a snapshot (`Arc<VectorIndex>`) and search it without holding
//! any lock; a rebuild replaces the whole index in one step.

use crate::config::RetrievalSettings;
use crate::embeddings::Embedder;
use crate::storage::{Result, SearchHit, VectorIndex};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

/// One retrieved chunk, as handed to the answer layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub chunk_id: u64,
    pub text: String,
    pub section_labels: Vec<String>,
    pub score: f32,
}

impl From<SearchHit> for RetrievalResult {
    fn from(hit: SearchHit) -> Self {
        Self {
            chunk_id: hit.metadata.chunk_id,
            text: hit.text,
            section_labels: hit.metadata.sections.into_iter().collect(),
            score: hit.score,
        }
    }
}

/// Shared reference to the current index
#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Arc<VectorIndex>>,
}

impl IndexHandle {
    pub fn new(index: VectorIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// Snapshot of the current index; stays valid after a swap
    pub fn current(&self) -> Arc<VectorIndex> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the index, returning the previous one
    pub fn replace(&self, index: VectorIndex) -> Arc<VectorIndex> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(index))
    }
}

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: IndexHandle,
    settings: RetrievalSettings,
}

impl Retriever {
    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>, settings: RetrievalSettings) -> Self {
        if index.model_id() != embedder.model_id() {
            log::warn!(
                "Index was built with '{}' but queries use '{}'",
                index.model_id(),
                embedder.model_id()
            );
        }
        Self {
            embedder,
            index: IndexHandle::new(index),
            settings,
        }
    }

    pub fn index(&self) -> &IndexHandle {
        &self.index
    }

    /// Top `top_k` chunks scoring at least `min_score`
    ///
    /// An empty result means nothing relevant was found. The threshold is
    /// never relaxed to produce a result.
    pub fn retrieve(&self, query: &str, top_k: usize, min_score: f32) -> Result<Vec<RetrievalResult>> {
        let index = self.index.current();
        let hits = index.search(query, top_k, min_score, self.embedder.as_ref())?;
        log::debug!("Query {:?} matched {} chunks", query, hits.len());
        Ok(hits.into_iter().map(RetrievalResult::from).collect())
    }

    /// [`Retriever::retrieve`] with the configured `top_k` and `min_score`
    pub fn retrieve_default(&self, query: &str) -> Result<Vec<RetrievalResult>> {
        self.retrieve(query, self.settings.top_k, self.settings.min_score)
    }

    /// Swap in a freshly built index
    pub fn replace_index(&self, index: VectorIndex) -> Arc<VectorIndex> {
        self.index.replace(index)
    }
}
