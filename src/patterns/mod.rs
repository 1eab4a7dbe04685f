//! Agent reasoning patterns
//!
//! Each pattern drives one or more [`Agent`](crate::llm::Agent) loops over the shared
//! tool registry. [`AgentStrategy::execute_query`] wraps every pattern with the answer
//! cache and turns failures into an error outcome.

mod conversational;
mod multi_agent;
mod plan_execute;
mod react;
mod self_ask;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheManager;
use crate::config::{AgentPattern, PatternConfig, Settings};
use crate::llm::{
    Agent, AgentError, AgentRun, FunctionRegistry, LlmError, LlmProvider, RegistryError,
};

pub use conversational::ConversationalPattern;
pub use multi_agent::{route_specialists, MultiAgentPattern, Specialist, SPECIALISTS};
pub use plan_execute::{parse_plan, PlanExecutePattern};
pub use react::ReactPattern;
pub use self_ask::SelfAskPattern;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Unsupported agent pattern: {0}")]
    Unsupported(AgentPattern),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Query exceeded the {}s time limit", .0.as_secs())]
    TimedOut(Duration),
}

/// What a pattern produced for one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub output: String,
    #[serde(default)]
    pub error: bool,
    /// Tool calls made while answering, one line each
    #[serde(default)]
    pub steps: Vec<String>,
    /// Plan produced by plan-and-execute
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plan: Vec<String>,
    /// Answers from each consulted specialist, keyed by specialist
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specialist_responses: BTreeMap<String, String>,
    #[serde(default)]
    pub coordination_used: bool,
}

impl QueryOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            error: true,
            ..Self::default()
        }
    }
}

impl From<AgentRun> for QueryOutcome {
    fn from(run: AgentRun) -> Self {
        Self {
            output: run.output,
            steps: run.steps,
            ..Self::default()
        }
    }
}

/// Everything a pattern needs to build its agents
#[derive(Clone)]
pub struct PatternDeps {
    pub provider: Arc<dyn LlmProvider>,
    pub registry: FunctionRegistry,
    pub settings: Settings,
    pub cache: Option<CacheManager>,
}

impl PatternDeps {
    fn config(&self, pattern: AgentPattern) -> PatternConfig {
        self.settings.pattern_config(pattern)
    }

    /// An agent over `tools` with the iteration bound and stopping rule from `config`
    fn agent(
        &self,
        tools: &FunctionRegistry,
        system: impl Into<String>,
        config: &PatternConfig,
    ) -> Agent {
        Agent::new(
            self.provider.clone(),
            Arc::new(tools.clone()),
            tools.declarations(),
            self.settings.generation_config(),
            Some(system.into()),
        )
        .with_max_iterations(config.max_iterations)
        .with_early_stopping(config.early_stopping)
    }
}

/// A way of answering queries
#[async_trait]
pub trait AgentStrategy: Send + Sync {
    fn pattern(&self) -> AgentPattern;

    fn cache(&self) -> Option<&CacheManager>;

    /// Answer `query` without caching or error capture
    async fn run(&mut self, query: &str) -> Result<QueryOutcome, PatternError>;

    /// Answer `query`, consulting the cache first and storing successful answers
    ///
    /// Cache entries are keyed by pattern and query. Never fails; errors come back as
    /// an outcome with `error` set.
    async fn execute_query(&mut self, query: &str) -> QueryOutcome {
        let key = cache_key(self.pattern(), query);
        if let Some(cache) = self.cache() {
            if let Some(hit) = cache.get::<QueryOutcome>(&key).await {
                tracing::debug!(%query, "Answer served from cache");
                return hit;
            }
        }

        match self.run(query).await {
            Ok(outcome) => {
                if let Some(cache) = self.cache() {
                    cache.set(&key, &outcome).await;
                }
                outcome
            }
            Err(e) => {
                tracing::error!(pattern = %self.pattern(), error = %e, "Query failed");
                QueryOutcome::failure(format!("Error executing query: {}", e))
            }
        }
    }
}

fn cache_key(pattern: AgentPattern, query: &str) -> String {
    format!("{}:{}", pattern, query)
}

/// Patterns the factory can build
pub const AVAILABLE_PATTERNS: [AgentPattern; 5] = [
    AgentPattern::React,
    AgentPattern::PlanExecute,
    AgentPattern::MultiAgent,
    AgentPattern::Conversational,
    AgentPattern::SelfAsk,
];

/// One-line summary shown in the pattern picker
pub fn describe(pattern: AgentPattern) -> &'static str {
    match pattern {
        AgentPattern::React => {
            "Reasoning + Acting: Thinks step by step and uses tools iteratively"
        }
        AgentPattern::PlanExecute => {
            "Plan then Execute: Creates a plan first, then executes each step"
        }
        AgentPattern::MultiAgent => {
            "Multiple Specialists: Uses specialized agents working together"
        }
        AgentPattern::Conversational => {
            "Conversational: Maintains context and memory across interactions"
        }
        AgentPattern::SelfAsk => "Self-Ask: Breaks down complex questions into sub-questions",
        _ => "Unknown pattern",
    }
}

/// Build the strategy for `pattern`
pub fn create_pattern(
    pattern: AgentPattern,
    deps: PatternDeps,
) -> Result<Box<dyn AgentStrategy>, PatternError> {
    tracing::debug!(%pattern, "Creating agent pattern");
    let strategy: Box<dyn AgentStrategy> = match pattern {
        AgentPattern::React => Box::new(ReactPattern::new(deps)),
        AgentPattern::PlanExecute => Box::new(PlanExecutePattern::new(deps)),
        AgentPattern::MultiAgent => Box::new(MultiAgentPattern::new(deps)),
        AgentPattern::Conversational => Box::new(ConversationalPattern::new(deps)),
        AgentPattern::SelfAsk => Box::new(SelfAskPattern::new(deps)),
        other => return Err(PatternError::Unsupported(other)),
    };
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptions_cover_available_patterns() {
        for pattern in AVAILABLE_PATTERNS {
            assert_ne!(describe(pattern), "Unknown pattern");
        }
        assert_eq!(describe(AgentPattern::StructuredChat), "Unknown pattern");
    }

    #[test]
    fn test_outcome_round_trips_through_cache_format() {
        let mut outcome = QueryOutcome::from(AgentRun {
            output: "fine".to_string(),
            steps: vec!["live_system_info -> ok".to_string()],
        });
        outcome
            .specialist_responses
            .insert("performance".to_string(), "ok".to_string());
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("plan").is_none());
        let back: QueryOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn test_cache_key_includes_pattern() {
        assert_eq!(cache_key(AgentPattern::React, "uptime?"), "react:uptime?");
        assert_ne!(
            cache_key(AgentPattern::React, "uptime?"),
            cache_key(AgentPattern::PlanExecute, "uptime?")
        );
    }

    #[test]
    fn test_failure_outcome() {
        let outcome = QueryOutcome::failure("Error executing query: boom");
        assert!(outcome.error);
        assert!(outcome.steps.is_empty());
    }
}
