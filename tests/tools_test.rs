//! Domain tools invoked through the registry the agents use

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{app, app_with_confirmer, settings, text, MockProvider};
use serde_json::{json, Map};
use sysadmin_agent::llm::ToolExecutor;
use sysadmin_agent::tools::{Confirmer, FixedReply};

/// Replies with a fixed answer and remembers what it was asked
struct RecordingConfirmer {
    reply: &'static str,
    asked: Mutex<Vec<String>>,
}

#[async_trait]
impl Confirmer for RecordingConfirmer {
    async fn ask(&self, command: &str) -> String {
        self.asked.lock().unwrap().push(command.to_string());
        self.reply.to_string()
    }
}

#[tokio::test]
async fn test_registry_exposes_all_tools() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(settings(dir.path()), MockProvider::scripted(vec![])).await;

    assert_eq!(
        app.registry.names(),
        vec![
            "rag_query",
            "live_system_info",
            "system_action",
            "external_search",
            "system_health_check",
            "security_scan",
        ]
    );
    for declaration in app.registry.declarations() {
        assert!(!declaration.description.is_empty(), "{}", declaration.name);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_system_action_runs_after_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let confirmer = Arc::new(RecordingConfirmer {
        reply: "yes",
        asked: Mutex::new(Vec::new()),
    });
    let app = app_with_confirmer(
        settings(dir.path()),
        MockProvider::scripted(vec![]),
        confirmer.clone(),
    )
    .await;

    let result = app
        .registry
        .execute(
            "call-1".into(),
            "system_action".into(),
            json!({"command": "echo restarted"}),
        )
        .await
        .unwrap();

    assert_eq!(result.trim_end(), "Command executed successfully:\nrestarted");
    assert_eq!(*confirmer.asked.lock().unwrap(), vec!["echo restarted"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_system_action_declined() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("touched");
    let app = app(settings(dir.path()), MockProvider::scripted(vec![])).await;

    let result = app
        .registry
        .execute(
            "call-1".into(),
            "system_action".into(),
            json!({"command": format!("touch {}", marker.display())}),
        )
        .await
        .unwrap();

    assert_eq!(result, "System action cancelled by user.");
    assert!(!marker.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_system_action_without_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = settings(dir.path());
    config.require_confirmation = false;
    let app = app_with_confirmer(
        config,
        MockProvider::scripted(vec![]),
        Arc::new(FixedReply("yes".into())),
    )
    .await;

    let ok = app
        .registry
        .execute("a".into(), "system_action".into(), json!({"command": "echo done"}))
        .await
        .unwrap();
    assert_eq!(ok.trim_end(), "Command executed: done");

    let failed = app
        .registry
        .execute(
            "b".into(),
            "system_action".into(),
            json!({"command": "echo broken >&2; exit 3"}),
        )
        .await
        .unwrap();
    assert_eq!(failed.trim_end(), "Command failed: broken");
}

#[tokio::test]
async fn test_live_system_info_enforces_safe_mode() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(settings(dir.path()), MockProvider::scripted(vec![])).await;

    let result = app
        .registry
        .execute(
            "call-1".into(),
            "live_system_info".into(),
            json!({"command_or_request": "shutdown -h now"}),
        )
        .await
        .unwrap();

    assert!(result.starts_with("Command 'shutdown -h now' is not in the safe commands list"));
}

#[tokio::test]
async fn test_live_system_info_memory_report() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(settings(dir.path()), MockProvider::scripted(vec![])).await;

    let result = app
        .registry
        .execute(
            "call-1".into(),
            "live_system_info".into(),
            json!({"command_or_request": "how much RAM is free"}),
        )
        .await;
    let result = tokio_test::assert_ok!(result);

    assert!(!result.is_empty());
    assert!(!result.starts_with("Command"));
}

#[tokio::test]
async fn test_rag_query_answers_from_indexed_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::scripted(vec![text("CPU was at 12% on the last snapshot.")]);
    let app = app(settings(dir.path()), provider.clone()).await;

    let mut metadata = Map::new();
    metadata.insert("timestamp".into(), json!("2026-10-01T10:00:00+00:00"));
    app.vector_store
        .add_system_data("CPU Usage: 12%\nMemory Usage: 40%", metadata)
        .await
        .unwrap();

    let result = app
        .registry
        .execute(
            "call-1".into(),
            "rag_query".into(),
            json!({"query": "CPU usage"}),
        )
        .await
        .unwrap();

    assert_eq!(result, "CPU was at 12% on the last snapshot.");
    let prompt = provider.requests()[0].messages[0].text();
    assert!(prompt.contains("answer the user's query: \"CPU usage\""));
    assert!(prompt.contains("CPU Usage: 12%"));
}

#[tokio::test]
async fn test_rag_query_reports_model_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(settings(dir.path()), MockProvider::scripted(vec![])).await;
    app.vector_store
        .add_system_data("Disk /: 91% used", Map::new())
        .await
        .unwrap();

    let result = app
        .registry
        .execute("call-1".into(), "rag_query".into(), json!({"query": "disk"}))
        .await
        .unwrap_err();

    assert!(result.starts_with("Error querying system information:"));
}

#[tokio::test]
async fn test_bad_arguments_are_tool_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(settings(dir.path()), MockProvider::scripted(vec![])).await;

    let result = app
        .registry
        .execute("call-1".into(), "rag_query".into(), json!({"wrong": 1}))
        .await;
    tokio_test::assert_err!(result);
}
