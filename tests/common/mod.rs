#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysadmin_agent::cli::App;
use sysadmin_agent::config::{EmbeddingBackend, Settings};
use sysadmin_agent::llm::core::provider::EventStream;
use sysadmin_agent::llm::core::types::{ContentBlockStart, PartialToolUse};
use sysadmin_agent::llm::{
    ContentDelta, FinishReason, GenerateRequest, LlmError, LlmProvider, StreamEvent, UsageMetadata,
};
use sysadmin_agent::tools::{Confirmer, FixedReply};

type Responder = dyn Fn(&GenerateRequest, usize) -> Option<Vec<StreamEvent>> + Send + Sync;

/// Provider that answers from a script and records every request
pub struct MockProvider {
    respond: Box<Responder>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockProvider {
    /// Call `n` gets `responses[n]`; running past the end is a stream error
    pub fn scripted(responses: Vec<Vec<StreamEvent>>) -> Arc<Self> {
        Self::with(move |_, n| responses.get(n).cloned())
    }

    /// Decide each response from the request and the call index
    pub fn with<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&GenerateRequest, usize) -> Option<Vec<StreamEvent>> + Send + Sync + 'static,
    {
        Arc::new(Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let events = {
            let mut requests = self.requests.lock().unwrap();
            let index = requests.len();
            let events = (self.respond)(&request, index);
            requests.push(request);
            events
        };
        let events = events.ok_or_else(|| LlmError::StreamError("No more responses".into()))?;
        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }
}

pub fn text(text: &str) -> Vec<StreamEvent> {
    vec![
        StreamEvent::ContentDelta {
            index: 0,
            delta: ContentDelta::TextDelta {
                text: text.to_string(),
            },
        },
        StreamEvent::MessageEnd {
            finish_reason: FinishReason::Stop,
            usage: UsageMetadata::default(),
        },
    ]
}

pub fn tool_call(id: &str, name: &str, args: serde_json::Value) -> Vec<StreamEvent> {
    vec![
        StreamEvent::ContentBlockStart {
            index: 0,
            block: ContentBlockStart::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
            },
        },
        StreamEvent::ContentDelta {
            index: 0,
            delta: ContentDelta::ToolUseDelta {
                partial: PartialToolUse {
                    id: None,
                    name: Some(name.to_string()),
                    partial_json: args.to_string(),
                },
            },
        },
        StreamEvent::ContentBlockEnd { index: 0 },
        StreamEvent::MessageEnd {
            finish_reason: FinishReason::Stop,
            usage: UsageMetadata::default(),
        },
    ]
}

/// Offline settings with all state under `dir`
pub fn settings(dir: &Path) -> Settings {
    Settings {
        vector_db_path: dir.join("vector_db"),
        cache_dir: dir.join("cache"),
        memory_file: dir.join("memory.json"),
        embedding_backend: EmbeddingBackend::Local,
        enable_caching: false,
        enable_background_collection: false,
        ..Settings::default()
    }
}

pub async fn app(settings: Settings, provider: Arc<MockProvider>) -> App {
    app_with_confirmer(settings, provider, Arc::new(FixedReply::deny())).await
}

pub async fn app_with_confirmer(
    settings: Settings,
    provider: Arc<MockProvider>,
    confirmer: Arc<dyn Confirmer>,
) -> App {
    App::with_provider(settings, provider, confirmer)
        .await
        .expect("Failed to build app")
}
