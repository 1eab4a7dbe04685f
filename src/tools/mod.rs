//! Domain tools exposed to the agents
//!
//! Every tool is a `#[tool]` function taking the shared [`ToolContext`]; see
//! [`build_registry`] for the full set.

mod action;
mod confirm;
mod inspect;
mod search;

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::config::Settings;
use crate::knowledge::VectorStore;
use crate::llm::{FunctionRegistry, LlmProvider, RegistryError};

pub use action::{system_action, system_action_tool, SystemActionArgs};
pub use confirm::{is_affirmative, Confirmer, FixedReply};
pub use inspect::{
    live_system_info, live_system_info_tool, security_scan, security_scan_tool,
    system_health_check, system_health_check_tool, LiveInfoArgs,
};
pub use search::{external_search, external_search_tool, rag_query, rag_query_tool, QueryArgs};

/// State shared by every tool call
pub struct ToolContext {
    pub settings: Settings,
    pub vector_store: Arc<VectorStore>,
    /// Model used to phrase answers from retrieved context
    pub provider: Arc<dyn LlmProvider>,
    pub confirmer: Arc<dyn Confirmer>,
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("vector_store", &self.vector_store)
            .finish_non_exhaustive()
    }
}

/// Arguments for tools that take none
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoArgs {}

/// Registry holding all six tools bound to `ctx`
pub fn build_registry(ctx: Arc<ToolContext>) -> Result<FunctionRegistry, RegistryError> {
    let mut registry = FunctionRegistry::new();
    registry.register(rag_query_tool::registration(ctx.clone()))?;
    registry.register(live_system_info_tool::registration(ctx.clone()))?;
    registry.register(system_action_tool::registration(ctx))?;
    registry.register(external_search_tool::registration())?;
    registry.register(system_health_check_tool::registration())?;
    registry.register(security_scan_tool::registration())?;
    Ok(registry)
}
