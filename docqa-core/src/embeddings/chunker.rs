//! Structural chunking for embedding generation
//!
//! Groups classified document elements into word-bounded chunks in a single
//! left-to-right pass. Section headers always close the running chunk; year and
//! project headers close it only once it has reached the minimum size; any
//! element that would push the running chunk past the maximum closes it too.

use super::{EmbeddingError, Result};
use crate::document::{Element, ElementType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Separator placed between element texts inside a chunk
pub const ELEMENT_SEPARATOR: &str = "\n";

/// What happens to an accumulator that is closed below the minimum size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndersizedPolicy {
    /// Discard the material
    #[default]
    Drop,
    /// Append the material to the previously emitted chunk, if any. The
    /// receiving chunk may then exceed `max_words`.
    MergeBackward,
}

/// Configuration for the section chunker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Minimum number of words for a chunk to be emitted
    pub min_words: usize,
    /// Soft cap on words per chunk
    pub max_words: usize,
    pub undersized: UndersizedPolicy,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_words: 50,
            max_words: 300,
            undersized: UndersizedPolicy::Drop,
        }
    }
}

impl ChunkerConfig {
    pub fn new(min_words: usize, max_words: usize) -> Self {
        Self {
            min_words,
            max_words,
            undersized: UndersizedPolicy::Drop,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_words == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "max_words must be greater than zero".to_string(),
            ));
        }
        if self.min_words > self.max_words {
            return Err(EmbeddingError::InvalidConfig(format!(
                "min_words ({}) exceeds max_words ({})",
                self.min_words, self.max_words
            )));
        }
        Ok(())
    }
}

/// A contiguous, bounded group of elements forming one retrievable unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in creation order
    pub chunk_id: u64,
    pub text: String,
    pub sections: BTreeSet<String>,
    pub element_types: BTreeSet<ElementType>,
    pub word_count: u32,
    pub source_element_ids: Vec<u64>,
}

impl Chunk {
    /// Metadata record stored alongside the chunk's vector
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            chunk_id: self.chunk_id,
            sections: self.sections.clone(),
            element_types: self.element_types.clone(),
            word_count: self.word_count,
            num_elements: self.source_element_ids.len(),
            is_structured: self.element_types.iter().any(|t| t.is_list_item()),
            has_header: self.element_types.contains(&ElementType::SectionHeader),
        }
    }

    fn absorb(&mut self, elements: &[&Element], word_count: usize) {
        for element in elements {
            self.text.push_str(ELEMENT_SEPARATOR);
            self.text.push_str(&element.text);
            self.sections.insert(element.section.clone());
            self.element_types.insert(element.element_type);
            self.source_element_ids.push(element.sequence_index);
        }
        self.word_count += word_count as u32;
    }
}

/// Per-chunk metadata, duplicated into the index so lookups avoid re-joining chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_id: u64,
    pub sections: BTreeSet<String>,
    pub element_types: BTreeSet<ElementType>,
    pub word_count: u32,
    #[serde(default)]
    pub num_elements: usize,
    /// Contains numbered or bulleted items
    #[serde(default)]
    pub is_structured: bool,
    /// Contains a section header
    #[serde(default)]
    pub has_header: bool,
}

#[derive(Default)]
struct Accumulator<'a> {
    elements: Vec<&'a Element>,
    word_count: usize,
}

impl<'a> Accumulator<'a> {
    fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn push(&mut self, element: &'a Element, words: usize) {
        self.elements.push(element);
        self.word_count += words;
    }

    fn into_chunk(self, chunk_id: u64) -> Chunk {
        let text = self
            .elements
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(ELEMENT_SEPARATOR);

        Chunk {
            chunk_id,
            text,
            sections: self.elements.iter().map(|e| e.section.clone()).collect(),
            element_types: self.elements.iter().map(|e| e.element_type).collect(),
            word_count: self.word_count as u32,
            source_element_ids: self.elements.iter().map(|e| e.sequence_index).collect(),
        }
    }
}

/// Chunker that respects section structure and a word budget
pub struct SectionChunker {
    config: ChunkerConfig,
}

impl SectionChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Group elements into chunks, preserving source order
    pub fn create_chunks(&self, elements: &[Element]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current = Accumulator::default();

        for element in elements {
            let words = element.word_count();
            if self.starts_new_chunk(element, &current, words) {
                self.flush(std::mem::take(&mut current), &mut chunks);
            }
            current.push(element, words);
        }
        self.flush(current, &mut chunks);

        log::info!(
            "Created {} chunks from {} elements",
            chunks.len(),
            elements.len()
        );
        chunks
    }

    fn starts_new_chunk(&self, element: &Element, current: &Accumulator<'_>, words: usize) -> bool {
        if current.is_empty() {
            return false;
        }

        let structural = match element.element_type {
            ElementType::SectionHeader => true,
            ElementType::YearHeader | ElementType::ProjectHeader => {
                current.word_count >= self.config.min_words
            }
            _ => false,
        };

        structural || current.word_count + words > self.config.max_words
    }

    fn flush(&self, pending: Accumulator<'_>, chunks: &mut Vec<Chunk>) {
        if pending.is_empty() {
            return;
        }

        if pending.word_count >= self.config.min_words {
            let chunk_id = chunks.len() as u64;
            chunks.push(pending.into_chunk(chunk_id));
            return;
        }

        match (self.config.undersized, chunks.last_mut()) {
            (UndersizedPolicy::MergeBackward, Some(previous)) => {
                previous.absorb(&pending.elements, pending.word_count);
            }
            _ => {
                log::debug!(
                    "Dropping {} undersized words starting at element {}",
                    pending.word_count,
                    pending.elements[0].sequence_index
                );
            }
        }
    }
}

/// Chunk elements with the given bounds and the default undersized policy
pub fn create_chunks(elements: &[Element], min_words: usize, max_words: usize) -> Vec<Chunk> {
    SectionChunker::new(ChunkerConfig::new(min_words, max_words)).create_chunks(elements)
}

/// Size distribution of a chunk list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkStats {
    pub total_chunks: usize,
    pub total_words: u64,
    pub mean_words: f64,
    /// Chunks containing list items
    pub structured_chunks: usize,
    /// Fewer than 100 words
    pub small: usize,
    /// 100 to 249 words
    pub medium: usize,
    pub large: usize,
}

impl ChunkStats {
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        let mut stats = Self {
            total_chunks: chunks.len(),
            ..Default::default()
        };

        for chunk in chunks {
            stats.total_words += chunk.word_count as u64;
            if chunk.element_types.iter().any(|t| t.is_list_item()) {
                stats.structured_chunks += 1;
            }
            match chunk.word_count {
                0..=99 => stats.small += 1,
                100..=249 => stats.medium += 1,
                _ => stats.large += 1,
            }
        }

        if stats.total_chunks > 0 {
            stats.mean_words = stats.total_words as f64 / stats.total_chunks as f64;
        }
        stats
    }
}
