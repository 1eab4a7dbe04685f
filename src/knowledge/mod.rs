//! Local knowledge base for retrieval-augmented answers
//!
//! Snapshot reports are split into chunks, embedded and kept in a JSON-backed
//! vector collection that the `rag_query` tool searches.

pub mod embedding;
pub mod splitter;
pub mod store;

use thiserror::Error;

use crate::llm::core::error::LlmError;
use crate::storage::StorageError;

pub use embedding::{EmbeddingProvider, HashEmbedder};
pub use splitter::TextSplitter;
pub use store::{SearchHit, VectorStore};

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
