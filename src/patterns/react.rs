use async_trait::async_trait;

use super::{AgentStrategy, PatternDeps, PatternError, QueryOutcome};
use crate::cache::CacheManager;
use crate::config::{AgentPattern, PatternConfig};

const SYSTEM_PROMPT: &str = "\
You are an AI System Administrator Assistant using the ReAct (Reasoning + Acting) approach.

Guidelines:
1. Always think step by step before taking action
2. Use rag_query first to check existing system knowledge
3. Get live data when current information is needed
4. For system modifications, always use the system_action tool, which asks the user for confirmation
5. Provide clear, actionable advice with reasoning
6. If uncertain, ask clarifying questions or search externally";

/// Reason, call a tool, observe, repeat
pub struct ReactPattern {
    deps: PatternDeps,
    config: PatternConfig,
}

impl ReactPattern {
    pub fn new(deps: PatternDeps) -> Self {
        let config = deps.config(AgentPattern::React);
        Self { deps, config }
    }
}

#[async_trait]
impl AgentStrategy for ReactPattern {
    fn pattern(&self) -> AgentPattern {
        AgentPattern::React
    }

    fn cache(&self) -> Option<&CacheManager> {
        self.deps.cache.as_ref()
    }

    async fn run(&mut self, query: &str) -> Result<QueryOutcome, PatternError> {
        let mut agent = self.deps.agent(&self.deps.registry, SYSTEM_PROMPT, &self.config);
        Ok(agent.run_to_completion(query).await?.into())
    }
}
