//! Specialist agents coordinated by a synthesising call

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::future::join_all;

use super::{AgentStrategy, PatternDeps, PatternError, QueryOutcome};
use crate::cache::CacheManager;
use crate::config::{AgentPattern, CollaborationMode, PatternConfig};
use crate::llm::{collect_text, GenerateRequest};
use crate::tools::{
    external_search_tool, live_system_info_tool, rag_query_tool, security_scan_tool,
    system_action_tool, system_health_check_tool,
};

const SPECIALIST_ITERATIONS: usize = 5;

/// A domain expert with its own tool subset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specialist {
    pub key: &'static str,
    pub title: &'static str,
    pub expertise: &'static str,
    /// Routing keywords matched against the lower-cased query
    pub keywords: &'static [&'static str],
    /// `None` means every registered tool
    pub tools: Option<&'static [&'static str]>,
}

pub static SPECIALISTS: [Specialist; 3] = [
    Specialist {
        key: "performance",
        title: "Performance Monitoring Specialist",
        expertise: "Expert in system performance analysis, resource monitoring, and optimization",
        keywords: &["cpu", "memory", "disk", "performance", "slow", "usage", "resource"],
        tools: Some(&[
            live_system_info_tool::NAME,
            rag_query_tool::NAME,
            system_health_check_tool::NAME,
        ]),
    },
    Specialist {
        key: "security",
        title: "Security Specialist",
        expertise: "Expert in system security, vulnerability assessment, and security best practices",
        keywords: &["security", "vulnerability", "firewall", "malware", "attack", "breach"],
        tools: Some(&[
            system_action_tool::NAME,
            external_search_tool::NAME,
            security_scan_tool::NAME,
        ]),
    },
    Specialist {
        key: "troubleshooting",
        title: "Troubleshooting Specialist",
        expertise: "Expert in diagnosing and resolving system issues, log analysis, and problem solving",
        keywords: &["error", "problem", "issue", "fix", "troubleshoot", "debug", "crash"],
        tools: None,
    },
];

/// Specialists whose keywords appear in `query`; all of them when none match
pub fn route_specialists(query: &str) -> Vec<&'static Specialist> {
    let query = query.to_lowercase();
    let matched: Vec<&'static Specialist> = SPECIALISTS
        .iter()
        .filter(|s| s.keywords.iter().any(|k| query.contains(k)))
        .collect();
    if matched.is_empty() {
        SPECIALISTS.iter().collect()
    } else {
        matched
    }
}

fn specialist_prompt(specialist: &Specialist) -> String {
    format!(
        "You are a {}.\n{}\n\n\
         You work as part of a team of AI specialists. Your role is to provide expert \
         analysis and recommendations in your domain.\n\n\
         Focus on your expertise area and provide detailed technical analysis. \
         Finish with your specialist recommendation.",
        specialist.title, specialist.expertise
    )
}

const COORDINATOR_PROMPT: &str = "\
You are the Coordinator Agent for a team of AI System Administration specialists.

Your team consists of:
- Performance Monitoring Specialist: Handles performance analysis and optimization
- Security Specialist: Handles security analysis and recommendations
- Troubleshooting Specialist: Handles problem diagnosis and resolution

Your role:
1. Analyze the user's request
2. Review the specialist responses
3. Synthesize their expertise into a comprehensive answer
4. Resolve any conflicts between specialist recommendations
5. Provide a unified, actionable response

Provide a well-structured final answer that combines the best insights from all specialists.";

/// Routes a query to specialists, then merges their answers
pub struct MultiAgentPattern {
    deps: PatternDeps,
    config: PatternConfig,
}

impl MultiAgentPattern {
    pub fn new(deps: PatternDeps) -> Self {
        let mut config = deps.config(AgentPattern::MultiAgent);
        config.max_iterations = SPECIALIST_ITERATIONS;
        Self { deps, config }
    }

    async fn consult(
        &self,
        specialist: &Specialist,
        query: String,
    ) -> (String, Result<QueryOutcome, PatternError>) {
        let tools = match specialist.tools {
            Some(names) => self.deps.registry.filtered(names),
            None => self.deps.registry.clone(),
        };
        let mut agent = self.deps.agent(&tools, specialist_prompt(specialist), &self.config);
        tracing::debug!(specialist = specialist.key, tools = tools.len(), "Consulting specialist");
        let result = agent
            .run_to_completion(query)
            .await
            .map(QueryOutcome::from)
            .map_err(PatternError::from);
        (specialist.key.to_string(), result)
    }

    async fn coordinate(
        &self,
        query: &str,
        responses: &BTreeMap<String, String>,
    ) -> Result<String, PatternError> {
        let request = GenerateRequest::prompt(
            format!(
                "User request: {}\n\nSpecialist responses:\n{}\n\nFinal Coordinated Response:",
                query,
                format_responses(responses)
            ),
            self.deps.settings.generation_config(),
        )
        .with_system(COORDINATOR_PROMPT);
        Ok(collect_text(self.deps.provider.as_ref(), request).await?)
    }
}

fn format_responses(responses: &BTreeMap<String, String>) -> String {
    responses
        .iter()
        .map(|(key, response)| format!("{} Specialist Response:\n{}", title_case(key), response))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl AgentStrategy for MultiAgentPattern {
    fn pattern(&self) -> AgentPattern {
        AgentPattern::MultiAgent
    }

    /// Never cached: every query consults the specialists
    fn cache(&self) -> Option<&CacheManager> {
        None
    }

    async fn run(&mut self, query: &str) -> Result<QueryOutcome, PatternError> {
        if !self.deps.settings.enable_specialist_agents {
            // A single generalist answers directly
            let (_, result) = self.consult(&SPECIALISTS[2], query.to_string()).await;
            return result;
        }

        let selected = route_specialists(query);
        tracing::info!(
            specialists = ?selected.iter().map(|s| s.key).collect::<Vec<_>>(),
            "Routing query to specialists"
        );

        let results = match self.deps.settings.agent_collaboration_mode {
            CollaborationMode::Hierarchical => {
                join_all(selected.iter().map(|s| self.consult(s, query.to_string()))).await
            }
            CollaborationMode::PeerToPeer => {
                // Each specialist sees what the previous ones concluded
                let mut results = Vec::new();
                let mut shared = BTreeMap::new();
                for specialist in &selected {
                    let input = if shared.is_empty() {
                        query.to_string()
                    } else {
                        format!(
                            "{}\n\nFindings from other specialists so far:\n{}",
                            query,
                            format_responses(&shared)
                        )
                    };
                    let (key, result) = self.consult(specialist, input).await;
                    if let Ok(outcome) = &result {
                        shared.insert(key.clone(), outcome.output.clone());
                    }
                    results.push((key, result));
                }
                results
            }
        };

        let mut responses = BTreeMap::new();
        let mut steps = Vec::new();
        let mut last_error = None;
        for (key, result) in results {
            match result {
                Ok(outcome) => {
                    steps.extend(outcome.steps.into_iter().map(|s| format!("[{}] {}", key, s)));
                    responses.insert(key, outcome.output);
                }
                Err(e) => {
                    tracing::warn!(specialist = %key, error = %e, "Specialist failed");
                    last_error = Some(e);
                }
            }
        }

        if responses.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let output = self.coordinate(query, &responses).await?;
        Ok(QueryOutcome {
            output: output.trim().to_string(),
            steps,
            specialist_responses: responses,
            coordination_used: true,
            ..QueryOutcome::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(query: &str) -> Vec<&'static str> {
        route_specialists(query).iter().map(|s| s.key).collect()
    }

    #[test]
    fn test_routing() {
        assert_eq!(keys("Why is the server so slow?"), vec!["performance"]);
        assert_eq!(keys("Check firewall rules"), vec!["security"]);
        assert_eq!(
            keys("Memory usage error after the attack"),
            vec!["performance", "security", "troubleshooting"]
        );
        assert_eq!(keys("nginx crashed"), vec!["troubleshooting"]);
        assert_eq!(keys("hello"), vec!["performance", "security", "troubleshooting"]);
    }

    #[test]
    fn test_response_formatting() {
        let mut responses = BTreeMap::new();
        responses.insert("security".to_string(), "ports ok".to_string());
        responses.insert("performance".to_string(), "cpu fine".to_string());
        assert_eq!(
            format_responses(&responses),
            "Performance Specialist Response:\ncpu fine\n\nSecurity Specialist Response:\nports ok"
        );
    }
}
