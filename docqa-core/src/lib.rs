pub mod config;
pub mod document;
pub mod embeddings;
pub mod pipeline;
pub mod retrieval;
pub mod storage;

pub use config::Settings;
pub use document::{Element, ElementType};
pub use embeddings::{Chunk, Embedder, SectionChunker};
pub use retrieval::{IndexHandle, RetrievalResult, Retriever};
pub use storage::{IndexError, VectorIndex};
