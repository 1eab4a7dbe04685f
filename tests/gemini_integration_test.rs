//! Integration tests for the Gemini client and embedder
//!
//! These tests make real API calls. To run them:
//! 1. Run `sysadmin-agent init` and fill in `GEMINI_API_KEY` (or `GCP_PROJECT_ID` with
//!    `gcloud auth application-default login`) in `.env`
//! 2. Run: `cargo test --test gemini_integration_test -- --ignored`

mod common;

use std::sync::Arc;

use common::settings;
use futures::StreamExt;
use serde_json::json;
use sysadmin_agent::cli::App;
use sysadmin_agent::config::{AgentPattern, EmbeddingBackend, Settings};
use sysadmin_agent::knowledge::EmbeddingProvider;
use sysadmin_agent::llm::gemini::{GeminiEmbedder, GeminiModel};
use sysadmin_agent::llm::{
    collect_text, create_provider, ContentDelta, GenerateRequest, GenerationConfig, LlmError,
    LlmProvider, Message, StreamEvent, ToolDeclaration,
};
use sysadmin_agent::tools::FixedReply;

fn live_settings() -> Settings {
    dotenvy::dotenv().ok();
    Settings::from_env().expect("Invalid settings in .env")
}

/// Helper to create a test client
async fn create_test_client() -> Arc<dyn LlmProvider> {
    let settings = live_settings();
    let credentials = settings
        .credentials()
        .expect("GEMINI_API_KEY or GCP_PROJECT_ID required in .env");
    create_provider(settings.gemini_model, credentials)
        .await
        .expect("Failed to create Gemini client")
}

#[test]
fn test_model_ids() {
    assert_eq!(GeminiModel::Gemini20Flash.as_str(), "gemini-2.0-flash");
    assert_eq!(GeminiModel::Gemini25Flash.as_str(), "gemini-2.5-flash");
    assert_eq!(
        "models/gemini-2.5-pro".parse::<GeminiModel>().unwrap(),
        GeminiModel::Gemini25Pro
    );
    assert_eq!(
        "gemini-exp-1206".parse::<GeminiModel>().unwrap().as_str(),
        "gemini-exp-1206"
    );
}

#[test]
fn test_missing_credentials() {
    let settings = Settings::from_lookup(|_| None).unwrap();
    assert!(matches!(
        settings.credentials(),
        Err(LlmError::MissingCredentials)
    ));
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_gemini_simple_generation() {
    let client = create_test_client().await;

    let request = GenerateRequest::prompt(
        "What is 2+2? Answer with just the number.",
        GenerationConfig::new(100),
    );

    let mut stream = client
        .stream_generate(request)
        .await
        .expect("Failed to start stream");

    let mut text = String::new();
    let mut token_count = 0;

    while let Some(event) = stream.next().await {
        match event.expect("Stream error") {
            StreamEvent::ContentDelta {
                delta: ContentDelta::TextDelta { text: t },
                ..
            } => {
                text.push_str(&t);
            }
            StreamEvent::MessageEnd { usage, .. } => {
                token_count = usage.total_tokens;
            }
            _ => {}
        }
    }

    println!("Response: {}", text);
    assert!(text.contains('4'));
    assert!(token_count > 0);
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_gemini_system_prompt() {
    let client = create_test_client().await;

    let request = GenerateRequest::prompt("What is using my disk?", GenerationConfig::new(200))
        .with_system("You are a Linux system administrator. Mention the `du` command.");

    let text = collect_text(client.as_ref(), request)
        .await
        .expect("Generation failed");

    println!("Response: {}", text);
    assert!(text.contains("du"));
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_gemini_tool_call() {
    let client = create_test_client().await;

    let uptime_tool = ToolDeclaration {
        name: "live_system_info".to_string(),
        description: "Get real-time system information or execute specific system commands"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "command_or_request": {
                    "type": "string",
                    "description": "A metric to read or a read-only shell command"
                }
            },
            "required": ["command_or_request"]
        }),
    };

    let request = GenerateRequest {
        messages: vec![Message::user("How long has this machine been up? Use your tools.")],
        tools: Some(vec![uptime_tool]),
        config: GenerationConfig::new(200),
        system: None,
    };

    let mut stream = client
        .stream_generate(request)
        .await
        .expect("Failed to start stream");

    let mut tool_calls = Vec::new();
    while let Some(event) = stream.next().await {
        if let StreamEvent::ContentDelta {
            delta: ContentDelta::ToolUseDelta { partial },
            ..
        } = event.expect("Stream error")
        {
            tool_calls.push(partial);
        }
    }

    println!("Tool calls: {:?}", tool_calls);
    assert!(tool_calls
        .iter()
        .any(|tc| tc.name.as_deref() == Some("live_system_info")));
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_gemini_multi_turn_conversation() {
    let client = create_test_client().await;

    let request = GenerateRequest {
        messages: vec![
            Message::user("My web server is nginx."),
            Message::assistant("Noted, you are running nginx."),
            Message::user("Which web server do I run?"),
        ],
        tools: None,
        config: GenerationConfig::new(100),
        system: None,
    };

    let text = collect_text(client.as_ref(), request)
        .await
        .expect("Generation failed");

    println!("Response: {}", text);
    assert!(text.to_lowercase().contains("nginx"));
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_gemini_embeddings() {
    let settings = live_settings();
    let embedder = GeminiEmbedder::from_credentials(
        settings.credentials().expect("credentials required"),
        &settings.embedding_model,
    )
    .await
    .expect("Failed to create embedder");

    let vectors = embedder
        .embed_batch(&["CPU usage is high".to_string(), "Disk is full".to_string()])
        .await
        .expect("Embedding failed");

    assert_eq!(vectors.len(), 2);
    assert!(!vectors[0].is_empty());
    assert_eq!(vectors[0].len(), vectors[1].len());
    assert_eq!(embedder.name(), settings.embedding_model);
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_react_agent_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let live = live_settings();
    let settings = Settings {
        gemini_api_key: live.gemini_api_key,
        gcp_project_id: live.gcp_project_id,
        gcp_location: live.gcp_location,
        embedding_backend: EmbeddingBackend::Local,
        ..settings(dir.path())
    };

    let app = App::build(settings, Arc::new(FixedReply::deny()))
        .await
        .expect("Failed to build app");
    let mut strategy = app.strategy(AgentPattern::React).unwrap();
    let outcome = strategy
        .execute_query("What is the current memory usage on this machine?")
        .await;

    println!("Answer: {}\nSteps: {:?}", outcome.output, outcome.steps);
    assert!(!outcome.error, "{}", outcome.output);
    assert!(!outcome.output.is_empty());
}
