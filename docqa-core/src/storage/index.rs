//! Flat inner-product vector index
//!
//! Row `i` of the vector matrix, `texts[i]` and `metadata[i]` all describe the
//! same chunk. Vectors are L2-normalized on insertion, so inner product equals
//! cosine similarity.

use super::{IndexError, Result};
use crate::embeddings::chunker::{Chunk, ChunkMetadata};
use crate::embeddings::{l2_normalize, Embedder};
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::Serialize;
use std::collections::BTreeSet;

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Cosine similarity in `[-1, 1]`
    pub score: f32,
}

/// Summary of an index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub record_count: usize,
    pub dimension: usize,
    pub model_id: String,
    pub total_words: u64,
    pub distinct_sections: usize,
}

/// Searchable, immutable vector index
#[derive(Debug, Clone)]
pub struct VectorIndex {
    model_id: String,
    vectors: Array2<f32>,
    texts: Vec<String>,
    metadata: Vec<ChunkMetadata>,
}

impl VectorIndex {
    /// Embed every chunk in order and build the index
    pub fn build(chunks: &[Chunk], embedder: &dyn Embedder) -> Result<Self> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyInput);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts)?;
        Self::from_embeddings(chunks, embeddings, embedder.model_id())
    }

    /// Finalize an index from chunks and their raw (unnormalized) embeddings
    ///
    /// The dimension is taken from the first embedding; every other embedding
    /// must match it.
    pub fn from_embeddings(
        chunks: &[Chunk],
        embeddings: Vec<Vec<f32>>,
        model_id: impl Into<String>,
    ) -> Result<Self> {
        let first = match embeddings.first() {
            Some(first) if !chunks.is_empty() => first,
            _ => return Err(IndexError::EmptyInput),
        };
        if embeddings.len() != chunks.len() {
            return Err(IndexError::InvalidEmbedding(format!(
                "chunk count {} != embedding count {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimension = first.len();
        if dimension == 0 {
            return Err(IndexError::InvalidEmbedding(
                "embedding has zero dimensions".to_string(),
            ));
        }

        let mut flat = Vec::with_capacity(chunks.len() * dimension);
        for mut embedding in embeddings {
            check_vector(&embedding, dimension)?;
            l2_normalize(&mut embedding);
            flat.extend(embedding);
        }

        let vectors = Array2::from_shape_vec((chunks.len(), dimension), flat)
            .map_err(|e| IndexError::InvalidEmbedding(e.to_string()))?;
        let index = Self {
            model_id: model_id.into(),
            vectors,
            texts: chunks.iter().map(|c| c.text.clone()).collect(),
            metadata: chunks.iter().map(Chunk::metadata).collect(),
        };

        log::info!(
            "Built vector index: {} vectors, dimension {}",
            index.len(),
            index.dimension()
        );
        Ok(index)
    }

    /// Assemble an index from already-normalized, aligned parts
    pub(crate) fn from_parts(
        model_id: String,
        vectors: Array2<f32>,
        texts: Vec<String>,
        metadata: Vec<ChunkMetadata>,
    ) -> Self {
        Self {
            model_id,
            vectors,
            texts,
            metadata,
        }
    }

    /// Search by query text
    ///
    /// Empty or whitespace-only queries return no results without calling the
    /// embedder.
    pub fn search(
        &self,
        query: &str,
        k: usize,
        threshold: f32,
        embedder: &dyn Embedder,
    ) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let embedding = embedder.embed(query)?;
        self.search_vector(&embedding, k, threshold)
    }

    /// Search with a precomputed query vector
    ///
    /// Takes the top `k` candidates by score, then drops those strictly below
    /// `threshold`. Results are ordered by descending score, ties by ascending
    /// insertion order.
    pub fn search_vector(&self, query: &[f32], k: usize, threshold: f32) -> Result<Vec<SearchHit>> {
        check_vector(query, self.dimension())?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);
        let scores = self.vectors.dot(&ArrayView1::from(&query[..]));

        // stable sort keeps ascending position among equal scores
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(k.min(self.len()));

        Ok(order
            .into_iter()
            .filter(|&i| scores[i] >= threshold)
            .map(|i| SearchHit {
                text: self.texts[i].clone(),
                metadata: self.metadata[i].clone(),
                score: scores[i],
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn metadata(&self) -> &[ChunkMetadata] {
        &self.metadata
    }

    pub fn vectors(&self) -> ArrayView2<'_, f32> {
        self.vectors.view()
    }

    pub fn stats(&self) -> IndexStats {
        let sections: BTreeSet<&str> = self
            .metadata
            .iter()
            .flat_map(|m| m.sections.iter().map(String::as_str))
            .collect();

        IndexStats {
            record_count: self.len(),
            dimension: self.dimension(),
            model_id: self.model_id.clone(),
            total_words: self.metadata.iter().map(|m| m.word_count as u64).sum(),
            distinct_sections: sections.len(),
        }
    }
}

fn check_vector(vector: &[f32], dimension: usize) -> Result<()> {
    if vector.len() != dimension {
        return Err(IndexError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(IndexError::InvalidEmbedding(
            "embedding contains non-finite values".to_string(),
        ));
    }
    Ok(())
}
