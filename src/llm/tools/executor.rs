//! The seam between the agent loop and tool implementations

use async_trait::async_trait;

/// Runs tool calls requested by the model
///
/// `Ok` carries the text handed back to the model; `Err` is reported to the model as a
/// failed call so it can recover, it does not abort the agent loop.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(
        &self,
        tool_use_id: String,
        name: String,
        arguments: serde_json::Value,
    ) -> Result<String, String>;
}
