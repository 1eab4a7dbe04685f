//! Application Default Credentials (ADC) wrapper

use std::sync::Arc;

use gcp_auth::TokenProvider;

use crate::llm::core::error::LlmError;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Hands out Vertex AI bearer tokens discovered through Application Default Credentials
///
/// Credential sources, in `gcp_auth` discovery order:
/// - `GOOGLE_APPLICATION_CREDENTIALS` environment variable
/// - User credentials from `gcloud auth application-default login`
/// - Metadata server (Compute Engine, Cloud Run, GKE)
///
/// Tokens are cached by `gcp_auth` and refreshed when they expire.
#[derive(Clone)]
pub struct AuthenticationManager {
    inner: Arc<dyn TokenProvider>,
}

impl AuthenticationManager {
    /// Discover credentials using the standard ADC flow
    pub async fn new() -> Result<Self, LlmError> {
        let inner = gcp_auth::provider().await.map_err(|e| {
            LlmError::AuthenticationError(format!("Failed to initialize ADC: {}", e))
        })?;

        Ok(Self { inner })
    }

    /// Get an access token for the cloud platform scope
    pub async fn get_token(&self) -> Result<String, LlmError> {
        let token = self
            .inner
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| LlmError::AuthenticationError(format!("Failed to get token: {}", e)))?;

        Ok(token.as_str().to_string())
    }
}

impl std::fmt::Debug for AuthenticationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationManager").finish_non_exhaustive()
    }
}
