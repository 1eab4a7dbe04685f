use async_trait::async_trait;

use super::{AgentStrategy, PatternDeps, PatternError, QueryOutcome};
use crate::cache::CacheManager;
use crate::config::AgentPattern;
use crate::llm::Agent;

const SYSTEM_PROMPT: &str = "\
You are an AI System Administrator Assistant with conversational capabilities.

You maintain context from previous conversations and can reference past interactions.

Guidelines:
1. Remember previous conversations and build upon them
2. Ask follow-up questions when appropriate
3. Provide personalized recommendations based on conversation history
4. Be helpful, friendly, and professional";

const DEFAULT_WINDOW: usize = 10;

/// One long-lived agent whose history is trimmed to the last few exchanges
///
/// Only completed turns are kept: a query that fails or is dropped mid-flight leaves
/// no unanswered user turn or unmatched tool call behind.
pub struct ConversationalPattern {
    deps: PatternDeps,
    agent: Agent,
    window: usize,
    /// History length after the last completed turn
    committed: usize,
}

impl ConversationalPattern {
    pub fn new(deps: PatternDeps) -> Self {
        let config = deps.config(AgentPattern::Conversational);
        let agent = deps.agent(&deps.registry, SYSTEM_PROMPT, &config);
        Self {
            window: config.memory_window.unwrap_or(DEFAULT_WINDOW),
            deps,
            agent,
            committed: 0,
        }
    }

    /// Messages carried into the next query
    pub fn history_len(&self) -> usize {
        self.committed
    }
}

#[async_trait]
impl AgentStrategy for ConversationalPattern {
    fn pattern(&self) -> AgentPattern {
        AgentPattern::Conversational
    }

    fn cache(&self) -> Option<&CacheManager> {
        self.deps.cache.as_ref()
    }

    async fn run(&mut self, query: &str) -> Result<QueryOutcome, PatternError> {
        self.agent.truncate_history(self.committed);
        self.agent.retain_recent_exchanges(self.window);
        self.committed = self.agent.messages().len();

        match self.agent.run_to_completion(query).await {
            Ok(run) => {
                self.committed = self.agent.messages().len();
                Ok(run.into())
            }
            Err(e) => {
                self.agent.truncate_history(self.committed);
                Err(e.into())
            }
        }
    }
}
