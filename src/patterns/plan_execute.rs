use async_trait::async_trait;

use super::{AgentStrategy, PatternDeps, PatternError, QueryOutcome};
use crate::cache::CacheManager;
use crate::config::{AgentPattern, PatternConfig};
use crate::llm::{collect_text, GenerateRequest};

const PLANNER_PROMPT: &str = "\
You are an AI System Administrator that uses a Plan-and-Execute approach.

PHASE 1 - PLANNING:
Analyze the user's request and create a detailed step-by-step plan.
Break down complex tasks into smaller, manageable steps.
Identify what tools and information you'll need for each step.

Reply with the plan only, one numbered step per line:
1. [First step with reasoning]
2. [Second step with reasoning]";

const EXECUTOR_PROMPT: &str = "\
You are an AI System Administrator that uses a Plan-and-Execute approach.

PHASE 2 - EXECUTION:
Execute each step of the plan below systematically.
Use the available tools to gather information and perform actions.
Adapt the plan if you discover new information during execution.
When every step is done, give a comprehensive final answer based on what you found.";

/// Plan first with a tool-less call, then execute the plan with tools
pub struct PlanExecutePattern {
    deps: PatternDeps,
    config: PatternConfig,
}

impl PlanExecutePattern {
    pub fn new(deps: PatternDeps) -> Self {
        let mut config = deps.config(AgentPattern::PlanExecute);
        // Executing a plan takes more tool rounds than answering directly
        config.max_iterations *= 2;
        Self { deps, config }
    }

    async fn plan_and_execute(&self, query: &str) -> Result<QueryOutcome, PatternError> {
        let tool_list = self
            .deps
            .registry
            .declarations()
            .iter()
            .map(|d| format!("{}: {}", d.name, d.description))
            .collect::<Vec<_>>()
            .join("\n");
        let request = GenerateRequest::prompt(
            format!("Available tools:\n{}\n\nQuestion: {}", tool_list, query),
            self.deps.settings.generation_config(),
        )
        .with_system(PLANNER_PROMPT);

        let plan = parse_plan(&collect_text(self.deps.provider.as_ref(), request).await?);
        tracing::info!(steps = plan.len(), "Plan created");

        let system = if plan.is_empty() {
            EXECUTOR_PROMPT.to_string()
        } else {
            let numbered = plan
                .iter()
                .enumerate()
                .map(|(i, step)| format!("{}. {}", i + 1, step))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}\n\nPlan:\n{}", EXECUTOR_PROMPT, numbered)
        };

        let mut agent = self.deps.agent(&self.deps.registry, system, &self.config);
        let run = agent.run_to_completion(query).await?;
        Ok(QueryOutcome {
            plan,
            ..run.into()
        })
    }
}

#[async_trait]
impl AgentStrategy for PlanExecutePattern {
    fn pattern(&self) -> AgentPattern {
        AgentPattern::PlanExecute
    }

    fn cache(&self) -> Option<&CacheManager> {
        self.deps.cache.as_ref()
    }

    async fn run(&mut self, query: &str) -> Result<QueryOutcome, PatternError> {
        match self.config.max_execution_time {
            Some(limit) => tokio::time::timeout(limit, self.plan_and_execute(query))
                .await
                .map_err(|_| PatternError::TimedOut(limit))?,
            None => self.plan_and_execute(query).await,
        }
    }
}

/// Numbered lines (`1.` or `1)`) of a plan, without their numbers
pub fn parse_plan(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim().trim_start_matches(['*', '#', ' ']);
            let digits = line.chars().take_while(char::is_ascii_digit).count();
            if digits == 0 {
                return None;
            }
            let rest = line[digits..].strip_prefix(['.', ')'])?;
            let step = rest.trim().trim_matches('*').trim();
            (!step.is_empty()).then(|| step.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan() {
        let text = "\
Here is my plan:
1. Check current CPU usage with live_system_info
2) Look at the top processes
**3.** Compare with stored snapshots
- not a step
10. Summarize findings
4.
";
        assert_eq!(
            parse_plan(text),
            vec![
                "Check current CPU usage with live_system_info",
                "Look at the top processes",
                "Compare with stored snapshots",
                "Summarize findings",
            ]
        );
    }

    #[test]
    fn test_parse_plan_without_numbers() {
        assert!(parse_plan("I will just answer directly.").is_empty());
    }
}
