//! JSON-backed vector collection
//!
//! Brute-force cosine search over every stored chunk. Collections here hold a few
//! hundred snapshot chunks, so a linear scan is enough.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::embedding::{cosine_similarity, EmbeddingProvider};
use super::splitter::TextSplitter;
use super::KnowledgeError;
use crate::storage::{read_json, write_json};

/// A stored chunk with its vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    #[serde(default)]
    embedder: String,
    #[serde(default)]
    chunks: Vec<StoredChunk>,
}

/// One similarity search result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub content: String,
    pub metadata: Map<String, Value>,
    /// Cosine distance, `1 - similarity`; lower is closer
    pub distance: f32,
}

pub struct VectorStore {
    path: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    splitter: TextSplitter,
    collection: RwLock<Collection>,
}

impl VectorStore {
    /// Open the collection at `path`, starting empty if the file does not exist
    ///
    /// A collection written by a different embedder is discarded since its vectors
    /// are not comparable.
    pub async fn open(
        path: impl Into<PathBuf>,
        embedder: Arc<dyn EmbeddingProvider>,
        splitter: TextSplitter,
    ) -> Result<Self, KnowledgeError> {
        let path = path.into();
        let mut collection: Collection = read_json(&path).await?.unwrap_or_default();

        if !collection.chunks.is_empty() && collection.embedder != embedder.name() {
            tracing::warn!(
                stored = %collection.embedder,
                current = %embedder.name(),
                "Embedding model changed, discarding stored vectors"
            );
            collection.chunks.clear();
        }
        collection.embedder = embedder.name().to_string();

        tracing::info!(
            chunks = collection.chunks.len(),
            path = %path.display(),
            "Opened vector store"
        );

        Ok(Self {
            path,
            embedder,
            splitter,
            collection: RwLock::new(collection),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.collection.read().await.chunks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Split, embed and store `text`; returns the number of chunks written
    ///
    /// Chunk ids are `chunk_<i>_<metadata.timestamp>`, so re-adding the same
    /// snapshot replaces its chunks instead of duplicating them.
    pub async fn add_system_data(
        &self,
        text: &str,
        metadata: Map<String, Value>,
    ) -> Result<usize, KnowledgeError> {
        let contents = self.splitter.split_text(text);
        if contents.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.embed_batch(&contents).await?;
        if embeddings.len() != contents.len() {
            return Err(KnowledgeError::Embedding(format!(
                "expected {} embeddings, got {}",
                contents.len(),
                embeddings.len()
            )));
        }

        let stamp = metadata
            .get("timestamp")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let new_chunks: Vec<StoredChunk> = contents
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| StoredChunk {
                id: format!("chunk_{}_{}", i, stamp),
                content,
                metadata: metadata.clone(),
                embedding,
            })
            .collect();
        let added = new_chunks.len();

        let mut collection = self.collection.write().await;
        collection
            .chunks
            .retain(|existing| !new_chunks.iter().any(|c| c.id == existing.id));
        collection.chunks.extend(new_chunks);
        write_json(&self.path, &*collection).await?;

        tracing::info!(added, total = collection.chunks.len(), "Indexed system data");
        Ok(added)
    }

    /// The `n_results` chunks closest to `query`, nearest first
    pub async fn query_similar(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<SearchHit>, KnowledgeError> {
        let collection = self.collection.read().await;
        if collection.chunks.is_empty() || n_results == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        let mut hits: Vec<SearchHit> = collection
            .chunks
            .iter()
            .map(|chunk| SearchHit {
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                distance: 1.0 - cosine_similarity(&query_vector, &chunk.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(n_results);
        Ok(hits)
    }

    /// Drop chunks whose `timestamp` metadata is older than `days_old` days
    ///
    /// Chunks without a parseable timestamp are kept. Returns the number removed.
    pub async fn clear_old_data(&self, days_old: u32) -> Result<usize, KnowledgeError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days_old));
        let mut collection = self.collection.write().await;
        let before = collection.chunks.len();
        collection.chunks.retain(|chunk| {
            chunk_time(chunk)
                .map(|time| time >= cutoff)
                .unwrap_or(true)
        });
        let removed = before - collection.chunks.len();
        if removed > 0 {
            write_json(&self.path, &*collection).await?;
            tracing::info!(removed, days_old, "Pruned old vector store chunks");
        }
        Ok(removed)
    }
}

fn chunk_time(chunk: &StoredChunk) -> Option<DateTime<Utc>> {
    let raw = chunk.metadata.get("timestamp")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("path", &self.path)
            .field("embedder", &self.embedder.name())
            .finish()
    }
}
