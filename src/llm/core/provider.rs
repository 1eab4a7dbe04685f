//! Provider trait for LLM implementations

use async_trait::async_trait;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;
use std::sync::Arc;

use super::{
    error::LlmError,
    types::{ContentDelta, GenerateRequest, StreamEvent},
};
use crate::llm::gemini::{GeminiClient, GeminiModel};

/// Boxed stream of provider events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Main interface that all LLM provider implementations must satisfy
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stream generate content from the LLM
    ///
    /// This method sends a request to the LLM and returns a stream of events
    /// representing the incremental response.
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError>;
}

/// How to reach Gemini
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmCredentials {
    /// Generative Language API key (`GEMINI_API_KEY`)
    ApiKey(String),
    /// Vertex AI with Application Default Credentials
    Vertex { project_id: String, location: String },
}

/// Create an LLM provider for the given model and credentials
///
/// Vertex AI credentials are resolved through ADC, so this may touch the
/// metadata server or the gcloud credential file.
pub async fn create_provider(
    model: GeminiModel,
    credentials: LlmCredentials,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let client = match credentials {
        LlmCredentials::ApiKey(api_key) => GeminiClient::with_api_key(api_key, model)?,
        LlmCredentials::Vertex {
            project_id,
            location,
        } => GeminiClient::vertex(project_id, location, model).await?,
    };
    Ok(Arc::new(client))
}

/// Run a tool-less request and return the concatenated text of the reply
pub async fn collect_text(
    provider: &dyn LlmProvider,
    request: GenerateRequest,
) -> Result<String, LlmError> {
    let mut stream = provider.stream_generate(request).await?;
    let mut text = String::new();

    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::ContentDelta {
                delta: ContentDelta::TextDelta { text: chunk },
                ..
            } => text.push_str(&chunk),
            StreamEvent::Error { error } => return Err(LlmError::StreamError(error)),
            StreamEvent::MessageEnd { .. } => break,
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::core::{
        config::GenerationConfig,
        types::{FinishReason, UsageMetadata},
    };

    struct CannedProvider(Vec<StreamEvent>);

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn stream_generate(&self, _request: GenerateRequest) -> Result<EventStream, LlmError> {
            Ok(Box::pin(futures::stream::iter(
                self.0.clone().into_iter().map(Ok),
            )))
        }
    }

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::ContentDelta {
            index: 0,
            delta: ContentDelta::TextDelta {
                text: text.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_collect_text_joins_deltas() {
        let provider = CannedProvider(vec![
            delta("Disk "),
            delta("is fine"),
            StreamEvent::MessageEnd {
                finish_reason: FinishReason::Stop,
                usage: UsageMetadata::default(),
            },
            delta(" (ignored)"),
        ]);
        let request = GenerateRequest::prompt("how is my disk?", GenerationConfig::default());
        let text = collect_text(&provider, request).await.unwrap();
        assert_eq!(text, "Disk is fine");
    }

    #[tokio::test]
    async fn test_collect_text_surfaces_stream_errors() {
        let provider = CannedProvider(vec![StreamEvent::Error {
            error: "quota".to_string(),
        }]);
        let request = GenerateRequest::prompt("x", GenerationConfig::default());
        let err = collect_text(&provider, request).await.unwrap_err();
        assert!(matches!(err, LlmError::StreamError(msg) if msg == "quota"));
    }
}
