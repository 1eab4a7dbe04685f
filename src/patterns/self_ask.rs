use async_trait::async_trait;

use super::{AgentStrategy, PatternDeps, PatternError, QueryOutcome};
use crate::cache::CacheManager;
use crate::config::{AgentPattern, PatternConfig};
use crate::llm::FunctionRegistry;

const SYSTEM_PROMPT: &str = "\
You are an AI System Administrator that uses self-questioning to solve problems.

When faced with a complex question, break it down by asking yourself sub-questions.

Work in this shape:
Are follow up questions needed here: Yes/No
Follow up: [sub-question if needed]
Intermediate answer: [answer to sub-question, using tools if needed]
... (repeat as needed)
So the final answer is: [final comprehensive answer]";

/// Decompose into follow-up questions answered one at a time
///
/// When a search tool is registered the agent gets only that tool, otherwise it
/// keeps the full tool set.
pub struct SelfAskPattern {
    deps: PatternDeps,
    config: PatternConfig,
    tools: FunctionRegistry,
}

impl SelfAskPattern {
    pub fn new(deps: PatternDeps) -> Self {
        let config = deps.config(AgentPattern::SelfAsk);
        let tools = search_tools(&deps.registry).unwrap_or_else(|| deps.registry.clone());
        Self {
            deps,
            config,
            tools,
        }
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.names()
    }
}

fn search_tools(registry: &FunctionRegistry) -> Option<FunctionRegistry> {
    let names = registry.names();
    let search = names
        .iter()
        .find(|n| n.to_lowercase().contains("search"))
        .or_else(|| names.iter().find(|n| n.to_lowercase().contains("external")))?;
    Some(registry.filtered(&[*search]))
}

#[async_trait]
impl AgentStrategy for SelfAskPattern {
    fn pattern(&self) -> AgentPattern {
        AgentPattern::SelfAsk
    }

    fn cache(&self) -> Option<&CacheManager> {
        self.deps.cache.as_ref()
    }

    async fn run(&mut self, query: &str) -> Result<QueryOutcome, PatternError> {
        let mut agent = self.deps.agent(&self.tools, SYSTEM_PROMPT, &self.config);
        Ok(agent.run_to_completion(query).await?.into())
    }
}
