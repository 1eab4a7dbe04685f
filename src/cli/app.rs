use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Map};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::CliError;
use crate::cache::CacheManager;
use crate::config::{AgentPattern, EmbeddingBackend, Settings};
use crate::knowledge::{EmbeddingProvider, HashEmbedder, KnowledgeError, TextSplitter, VectorStore};
use crate::llm::gemini::GeminiEmbedder;
use crate::llm::{create_provider, FunctionRegistry, LlmError, LlmProvider};
use crate::patterns::{create_pattern, AgentStrategy, PatternDeps, PatternError};
use crate::system::SystemDataCollector;
use crate::tools::{build_registry, Confirmer, ToolContext};

/// Wait before retrying a failed background collection
pub const RETRY_DELAY: Duration = Duration::from_secs(300);

/// Collects snapshots and indexes them into the vector store
#[derive(Debug, Clone)]
pub struct Indexer {
    collector: SystemDataCollector,
    store: Arc<VectorStore>,
    retention_days: Option<u32>,
    last_run: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl Indexer {
    pub fn new(collector: SystemDataCollector, store: Arc<VectorStore>) -> Self {
        Self {
            collector,
            store,
            retention_days: None,
            last_run: Arc::new(RwLock::new(None)),
        }
    }

    /// Prune snapshots older than `days` in [`Indexer::prune`]
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = Some(days);
        self
    }

    /// Take a snapshot and index it; returns the number of chunks written
    ///
    /// `collection_type` is stored in the chunk metadata (`manual`, `background`).
    pub async fn collect(&self, collection_type: &str) -> Result<usize, KnowledgeError> {
        let snapshot = self.collector.collect_all().await;

        let mut metadata = Map::new();
        metadata.insert("timestamp".into(), json!(snapshot.timestamp.to_rfc3339()));
        metadata.insert("platform".into(), json!(snapshot.basic_info.system));
        metadata.insert("collection_type".into(), json!(collection_type));

        let chunks = self
            .store
            .add_system_data(&snapshot.format_for_embedding(), metadata)
            .await?;
        *self.last_run.write().await = Some(Utc::now());

        tracing::info!(chunks, collection_type, "System data collected and indexed");
        Ok(chunks)
    }

    /// Drop indexed snapshots past the retention period; 0 when none is set
    pub async fn prune(&self) -> Result<usize, KnowledgeError> {
        match self.retention_days {
            Some(days) => self.store.clear_old_data(days).await,
            None => Ok(0),
        }
    }

    pub async fn last_run(&self) -> Option<DateTime<Utc>> {
        *self.last_run.read().await
    }
}

/// Re-index every `every` until `token` is cancelled
///
/// A failed run is retried after [`RETRY_DELAY`]. Old snapshots and expired cache
/// entries are purged after each successful run.
pub fn spawn_background_collection(
    indexer: Indexer,
    cache: Option<CacheManager>,
    every: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(every_secs = every.as_secs(), "Background collection started");
        loop {
            let wait = match indexer.collect("background").await {
                Ok(_) => {
                    if let Err(e) = indexer.prune().await {
                        tracing::warn!(error = %e, "Could not prune old snapshots");
                    }
                    if let Some(cache) = &cache {
                        if let Err(e) = cache.clear_expired().await {
                            tracing::warn!(error = %e, "Could not purge expired cache entries");
                        }
                    }
                    every
                }
                Err(e) => {
                    tracing::error!(error = %e, "Background collection failed");
                    RETRY_DELAY
                }
            };

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }
        tracing::info!("Background collection stopped");
    })
}

/// Embedder selected by `settings.embedding_backend`
pub async fn embedder(settings: &Settings) -> Result<Arc<dyn EmbeddingProvider>, LlmError> {
    let embedder: Arc<dyn EmbeddingProvider> = match settings.embedding_backend {
        EmbeddingBackend::Gemini => Arc::new(
            GeminiEmbedder::from_credentials(settings.credentials()?, &settings.embedding_model)
                .await?,
        ),
        EmbeddingBackend::Local => Arc::new(HashEmbedder::default()),
    };
    Ok(embedder)
}

/// The long-lived services behind every command
pub struct App {
    pub settings: Settings,
    pub provider: Arc<dyn LlmProvider>,
    pub vector_store: Arc<VectorStore>,
    pub cache: Option<CacheManager>,
    pub registry: FunctionRegistry,
    pub indexer: Indexer,
}

impl App {
    /// Connect to Gemini with the configured credentials and open local state
    pub async fn build(settings: Settings, confirmer: Arc<dyn Confirmer>) -> Result<Self, CliError> {
        let provider = create_provider(settings.gemini_model.clone(), settings.credentials()?).await?;
        Self::with_provider(settings, provider, confirmer).await
    }

    /// Open local state around an existing model provider
    pub async fn with_provider(
        settings: Settings,
        provider: Arc<dyn LlmProvider>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Result<Self, CliError> {
        let splitter = TextSplitter::new(settings.chunk_size, settings.chunk_overlap);
        let vector_store = Arc::new(
            VectorStore::open(settings.collection_path(), embedder(&settings).await?, splitter)
                .await?,
        );

        let cache = if settings.enable_caching {
            Some(
                CacheManager::new(
                    settings.cache_dir.clone(),
                    Duration::from_secs(settings.cache_ttl_seconds),
                )
                .await?,
            )
        } else {
            None
        };

        let registry = build_registry(Arc::new(ToolContext {
            settings: settings.clone(),
            vector_store: vector_store.clone(),
            provider: provider.clone(),
            confirmer,
        }))?;

        let indexer = Indexer::new(
            SystemDataCollector::new(settings.max_log_entries),
            vector_store.clone(),
        )
        .with_retention_days(settings.data_retention_days);

        Ok(Self {
            settings,
            provider,
            vector_store,
            cache,
            registry,
            indexer,
        })
    }

    pub fn pattern_deps(&self) -> PatternDeps {
        PatternDeps {
            provider: self.provider.clone(),
            registry: self.registry.clone(),
            settings: self.settings.clone(),
            cache: self.cache.clone(),
        }
    }

    pub fn strategy(&self, pattern: AgentPattern) -> Result<Box<dyn AgentStrategy>, PatternError> {
        create_pattern(pattern, self.pattern_deps())
    }

    /// Start periodic collection if enabled; `None` when it is switched off
    pub fn start_background_collection(&self, token: CancellationToken) -> Option<JoinHandle<()>> {
        if !self.settings.enable_background_collection {
            return None;
        }
        let every = Duration::from_secs(self.settings.collection_interval_hours.max(1) * 3600);
        Some(spawn_background_collection(
            self.indexer.clone(),
            self.cache.clone(),
            every,
            token,
        ))
    }
}
