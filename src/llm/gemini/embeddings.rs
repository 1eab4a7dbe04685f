//! Gemini text embeddings
//!
//! API-key mode uses `batchEmbedContents`; Vertex AI mode uses the publisher model
//! `predict` method. Both are exposed through [`EmbeddingProvider`].

use async_trait::async_trait;
use reqwest::Client;

use crate::knowledge::embedding::EmbeddingProvider;
use crate::knowledge::KnowledgeError;
use crate::llm::auth::adc::AuthenticationManager;
use crate::llm::core::error::LlmError;
use crate::llm::core::provider::LlmCredentials;

use super::client::{http_client, GeminiEndpoint};
use super::types::{
    BatchEmbedRequest, BatchEmbedResponse, Content, EmbedContentRequest, Part,
    VertexEmbedInstance, VertexPredictRequest, VertexPredictResponse,
};

/// Maximum texts sent in one embedding call
const BATCH_SIZE: usize = 100;

/// Embedding provider backed by a Gemini embedding model
pub struct GeminiEmbedder {
    http_client: Client,
    endpoint: GeminiEndpoint,
    model: String,
}

impl GeminiEmbedder {
    /// Embedder for the Generative Language API
    pub fn with_api_key(api_key: String, model: impl Into<String>) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingCredentials);
        }
        Ok(Self {
            http_client: http_client()?,
            endpoint: GeminiEndpoint::ApiKey { api_key },
            model: model.into(),
        })
    }

    /// Embedder for Vertex AI using Application Default Credentials
    pub async fn vertex(
        project_id: String,
        location: String,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let auth = AuthenticationManager::new().await?;
        Ok(Self {
            http_client: http_client()?,
            endpoint: GeminiEndpoint::Vertex {
                auth,
                project_id,
                location,
            },
            model: model.into(),
        })
    }

    /// Pick the endpoint that matches the configured credentials
    pub async fn from_credentials(
        credentials: LlmCredentials,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        match credentials {
            LlmCredentials::ApiKey(key) => Self::with_api_key(key, model),
            LlmCredentials::Vertex {
                project_id,
                location,
            } => Self::vertex(project_id, location, model).await,
        }
    }

    async fn post<B: serde::Serialize>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<reqwest::Response, LlmError> {
        let url = self
            .endpoint
            .model_url(self.model.trim_start_matches("models/"), method);
        let builder = self.http_client.post(&url).json(body);
        let response = self.endpoint.authorize(builder).await?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(
                status.as_u16(),
                retry_after.as_deref(),
                body,
            ));
        }
        Ok(response)
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if self.endpoint.is_vertex() {
            let request = VertexPredictRequest {
                instances: texts
                    .iter()
                    .map(|text| VertexEmbedInstance {
                        content: text.clone(),
                    })
                    .collect(),
            };
            let response: VertexPredictResponse =
                self.post("predict", &request).await?.json().await?;
            Ok(response
                .predictions
                .into_iter()
                .map(|p| p.embeddings.values)
                .collect())
        } else {
            let model = format!("models/{}", self.model.trim_start_matches("models/"));
            let request = BatchEmbedRequest {
                requests: texts
                    .iter()
                    .map(|text| EmbedContentRequest {
                        model: model.clone(),
                        content: Content {
                            role: "user".to_string(),
                            parts: vec![Part::Text { text: text.clone() }],
                        },
                    })
                    .collect(),
            };
            let response: BatchEmbedResponse =
                self.post("batchEmbedContents", &request).await?.json().await?;
            Ok(response.embeddings.into_iter().map(|e| e.values).collect())
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            let embedded = self.embed_chunk(chunk).await?;
            if embedded.len() != chunk.len() {
                return Err(KnowledgeError::Embedding(format!(
                    "expected {} embeddings, got {}",
                    chunk.len(),
                    embedded.len()
                )));
            }
            vectors.extend(embedded);
        }
        tracing::debug!(count = vectors.len(), model = %self.model, "Embedded texts");
        Ok(vectors)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for GeminiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEmbedder")
            .field("model", &self.model)
            .field("vertex", &self.endpoint.is_vertex())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        let result = GeminiEmbedder::with_api_key(String::new(), "text-embedding-004");
        assert!(matches!(result, Err(LlmError::MissingCredentials)));
    }

    #[test]
    fn test_batch_request_shape() {
        let request = BatchEmbedRequest {
            requests: vec![EmbedContentRequest {
                model: "models/text-embedding-004".to_string(),
                content: Content {
                    role: "user".to_string(),
                    parts: vec![Part::Text {
                        text: "uptime 3 days".to_string(),
                    }],
                },
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["requests"][0]["model"], "models/text-embedding-004");
        assert_eq!(json["requests"][0]["content"]["parts"][0]["text"], "uptime 3 days");
    }

    #[tokio::test]
    #[ignore] // Requires GEMINI_API_KEY
    async fn test_live_embedding() {
        dotenvy::dotenv().ok();
        let key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY not set");
        let embedder = GeminiEmbedder::with_api_key(key, "text-embedding-004").unwrap();
        let vectors = embedder
            .embed_batch(&["disk usage".to_string(), "cpu load".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(!vectors[0].is_empty());
    }
}
