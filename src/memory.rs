//! Conversation memory
//!
//! A bounded in-session window plus a long-term JSON log that survives restarts.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{read_json, write_json, StorageError};

const SESSION_WINDOW: usize = 20;
const LONG_TERM_LIMIT: usize = 1000;
const SUMMARY_EXCHANGES: usize = 3;
const SUMMARY_CHARS: usize = 100;

/// One question/answer pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub timestamp: DateTime<Utc>,
    pub user_input: String,
    pub ai_response: String,
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// An interaction with its keyword overlap score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredInteraction {
    pub interaction: Interaction,
    pub relevance_score: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LongTermMemory {
    #[serde(default)]
    interactions: Vec<Interaction>,
}

/// Session and long-term memory
#[derive(Debug)]
pub struct MemoryManager {
    path: PathBuf,
    session: VecDeque<Interaction>,
    session_total: usize,
    long_term: LongTermMemory,
}

impl MemoryManager {
    /// Load long-term memory from `path`; a missing or corrupt file starts empty
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let long_term = match read_json::<LongTermMemory>(&path).await {
            Ok(Some(memory)) => memory,
            Ok(None) => LongTermMemory::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Starting with empty long-term memory");
                LongTermMemory::default()
            }
        };

        tracing::debug!(
            interactions = long_term.interactions.len(),
            path = %path.display(),
            "Loaded long-term memory"
        );

        Self {
            path,
            session: VecDeque::with_capacity(SESSION_WINDOW),
            session_total: 0,
            long_term,
        }
    }

    /// Record an exchange and persist the long-term log
    pub async fn add_interaction(
        &mut self,
        user_input: &str,
        ai_response: &str,
        context: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), StorageError> {
        let interaction = Interaction {
            timestamp: Utc::now(),
            user_input: user_input.to_string(),
            ai_response: ai_response.to_string(),
            context,
        };

        if self.session.len() == SESSION_WINDOW {
            self.session.pop_front();
        }
        self.session.push_back(interaction.clone());
        self.session_total += 1;

        self.long_term.interactions.push(interaction);
        let excess = self
            .long_term
            .interactions
            .len()
            .saturating_sub(LONG_TERM_LIMIT);
        self.long_term.interactions.drain(..excess);

        write_json(&self.path, &self.long_term).await
    }

    /// Past interactions sharing words with `query`, best first
    pub fn get_relevant_context(&self, query: &str, max_items: usize) -> Vec<ScoredInteraction> {
        let query_words = word_set(query);

        let mut scored: Vec<ScoredInteraction> = self
            .long_term
            .interactions
            .iter()
            .filter_map(|interaction| {
                let mut words = word_set(&interaction.user_input);
                words.extend(word_set(&interaction.ai_response));
                let relevance_score = query_words.intersection(&words).count();
                (relevance_score > 0).then(|| ScoredInteraction {
                    interaction: interaction.clone(),
                    relevance_score,
                })
            })
            .collect();

        // Stable sort keeps older interactions first among equal scores
        scored.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        scored.truncate(max_items);
        scored
    }

    /// Human-readable recap of this session
    pub fn session_summary(&self) -> String {
        if self.session.is_empty() {
            return "No previous interactions in this session.".to_string();
        }

        let mut summary = format!("Session started with {} interactions:\n", self.session_total);
        let skip = self.session.len().saturating_sub(SUMMARY_EXCHANGES);
        for interaction in self.session.iter().skip(skip) {
            summary.push_str(&format!("User: {}...\n", truncate(&interaction.user_input)));
            summary.push_str(&format!("AI: {}...\n\n", truncate(&interaction.ai_response)));
        }
        summary
    }

    /// Exchanges in the session window, oldest first
    pub fn session(&self) -> impl Iterator<Item = &Interaction> {
        self.session.iter()
    }

    /// Number of interactions in the long-term log
    pub fn long_term_len(&self) -> usize {
        self.long_term.interactions.len()
    }
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn truncate(text: &str) -> String {
    text.chars().take(SUMMARY_CHARS).collect()
}
