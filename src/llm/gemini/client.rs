//! Gemini client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::str::FromStr;
use uuid::Uuid;

use crate::llm::auth::adc::AuthenticationManager;
use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::GenerateRequest,
};

use super::mapper::{create_message_start, from_gemini_response, to_gemini_request};
use super::sse::parse_sse_stream;

const GENERATIVE_LANGUAGE_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini model identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.0 Flash
    Gemini20Flash,
    /// Gemini 2.5 Pro
    Gemini25Pro,
    /// Gemini 2.5 Flash
    Gemini25Flash,
    /// Gemini 2.5 Flash Lite
    Gemini25FlashLite,
    /// Any other published model id
    Custom(String),
}

impl GeminiModel {
    /// Get the model identifier string
    pub fn as_str(&self) -> &str {
        match self {
            GeminiModel::Gemini20Flash => "gemini-2.0-flash",
            GeminiModel::Gemini25Pro => "gemini-2.5-pro",
            GeminiModel::Gemini25Flash => "gemini-2.5-flash",
            GeminiModel::Gemini25FlashLite => "gemini-2.5-flash-lite",
            GeminiModel::Custom(id) => id,
        }
    }
}

impl Default for GeminiModel {
    fn default() -> Self {
        GeminiModel::Gemini20Flash
    }
}

impl FromStr for GeminiModel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().trim_start_matches("models/");
        Ok(match id {
            "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
            "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
            "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
            "gemini-2.5-flash-lite" => GeminiModel::Gemini25FlashLite,
            other => GeminiModel::Custom(other.to_string()),
        })
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where requests go and how they are authenticated
#[derive(Debug, Clone)]
pub enum GeminiEndpoint {
    /// Generative Language API with an API key
    ApiKey { api_key: String },
    /// Vertex AI with ADC bearer tokens
    Vertex {
        auth: AuthenticationManager,
        project_id: String,
        location: String,
    },
}

impl GeminiEndpoint {
    /// URL for a model method such as `streamGenerateContent` or `embedContent`
    pub fn model_url(&self, model: &str, method: &str) -> String {
        match self {
            GeminiEndpoint::ApiKey { .. } => {
                format!("{}/models/{}:{}", GENERATIVE_LANGUAGE_BASE, model, method)
            }
            GeminiEndpoint::Vertex {
                project_id,
                location,
                ..
            } => format!(
                "https://{loc}-aiplatform.googleapis.com/v1/projects/{project}/locations/{loc}/publishers/google/models/{model}:{method}",
                loc = location,
                project = project_id,
                model = model,
                method = method,
            ),
        }
    }

    /// Attach credentials to an outgoing request
    pub async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, LlmError> {
        match self {
            GeminiEndpoint::ApiKey { api_key } => Ok(request.header("x-goog-api-key", api_key)),
            GeminiEndpoint::Vertex { auth, .. } => {
                let token = auth.get_token().await?;
                Ok(request.bearer_auth(token))
            }
        }
    }

    /// Whether this endpoint speaks the Vertex AI dialect
    pub fn is_vertex(&self) -> bool {
        matches!(self, GeminiEndpoint::Vertex { .. })
    }
}

/// Build the shared HTTP client
pub(crate) fn http_client() -> Result<Client, LlmError> {
    Client::builder()
        .connect_timeout(std::time::Duration::from_secs(5))
        .build()
        .map_err(|e| LlmError::HttpError {
            status: 0,
            body: format!("Failed to create HTTP client: {}", e),
        })
}

/// Client for interacting with Gemini models
pub struct GeminiClient {
    http_client: Client,
    endpoint: GeminiEndpoint,
    model: GeminiModel,
}

impl GeminiClient {
    /// Create a client for the Generative Language API
    pub fn with_api_key(api_key: String, model: GeminiModel) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingCredentials);
        }
        Ok(Self {
            http_client: http_client()?,
            endpoint: GeminiEndpoint::ApiKey { api_key },
            model,
        })
    }

    /// Create a client for Vertex AI using Application Default Credentials
    pub async fn vertex(
        project_id: String,
        location: String,
        model: GeminiModel,
    ) -> Result<Self, LlmError> {
        let auth = AuthenticationManager::new().await?;
        Ok(Self {
            http_client: http_client()?,
            endpoint: GeminiEndpoint::Vertex {
                auth,
                project_id,
                location,
            },
            model,
        })
    }

    /// Model this client talks to
    pub fn model(&self) -> &GeminiModel {
        &self.model
    }

    fn build_endpoint_url(&self) -> String {
        format!(
            "{}?alt=sse",
            self.endpoint
                .model_url(self.model.as_str(), "streamGenerateContent")
        )
    }

    async fn make_streaming_request(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let gemini_request = to_gemini_request(request);
        let url = self.build_endpoint_url();

        tracing::debug!(model = %self.model, vertex = self.endpoint.is_vertex(), "Calling Gemini");

        let builder = self.http_client.post(&url).json(&gemini_request);
        let response = self.endpoint.authorize(builder).await?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Gemini request failed");
            return Err(LlmError::from_status(
                status.as_u16(),
                retry_after.as_deref(),
                body,
            ));
        }

        let sse_stream = parse_sse_stream(Box::pin(response.bytes_stream()));

        let message_id = Uuid::new_v4().to_string();
        let mut emitted_start = false;
        let mut current_index = 0;

        let event_stream = sse_stream.map(move |result| {
            result.map(|gemini_response| {
                let mut events = Vec::new();
                if !emitted_start {
                    events.push(create_message_start(message_id.clone()));
                    emitted_start = true;
                }
                events.extend(from_gemini_response(gemini_response, &mut current_index));
                events
            })
        });

        let flattened = event_stream.flat_map(|result| {
            futures::stream::iter(match result {
                Ok(events) => events.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            })
        });

        Ok(Box::pin(flattened))
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        self.make_streaming_request(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_model_round_trips_through_str() {
        for id in ["gemini-2.0-flash", "gemini-2.5-pro", "gemini-2.5-flash-lite"] {
            let model: GeminiModel = id.parse().unwrap();
            assert_eq!(model.as_str(), id);
            assert!(!matches!(model, GeminiModel::Custom(_)));
        }
    }

    #[test]
    fn test_custom_model_and_prefix() {
        let model: GeminiModel = "models/gemini-exp-1206".parse().unwrap();
        assert_eq!(model, GeminiModel::Custom("gemini-exp-1206".to_string()));
        assert_eq!(GeminiModel::default().as_str(), "gemini-2.0-flash");
    }

    #[test]
    fn test_api_key_endpoint_url() {
        let client =
            GeminiClient::with_api_key("secret".to_string(), GeminiModel::Gemini20Flash).unwrap();
        assert_eq!(
            client.build_endpoint_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let result = GeminiClient::with_api_key("  ".to_string(), GeminiModel::default());
        assert!(matches!(result, Err(LlmError::MissingCredentials)));
    }
}
