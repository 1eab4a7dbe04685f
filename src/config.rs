//! Runtime settings
//!
//! Everything is read from environment variables (a `.env` file is loaded by the
//! binary before this runs). Unset keys fall back to the defaults below.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::llm::{EarlyStopping, GenerationConfig, GeminiModel, LlmCredentials, LlmError};

/// Errors raised while loading settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Agent reasoning strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPattern {
    React,
    PlanExecute,
    MultiAgent,
    Conversational,
    StructuredChat,
    SelfAsk,
    OpenaiFunctions,
}

impl AgentPattern {
    /// Every pattern, in menu order
    pub const ALL: [AgentPattern; 7] = [
        AgentPattern::React,
        AgentPattern::PlanExecute,
        AgentPattern::MultiAgent,
        AgentPattern::Conversational,
        AgentPattern::StructuredChat,
        AgentPattern::SelfAsk,
        AgentPattern::OpenaiFunctions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentPattern::React => "react",
            AgentPattern::PlanExecute => "plan_execute",
            AgentPattern::MultiAgent => "multi_agent",
            AgentPattern::Conversational => "conversational",
            AgentPattern::StructuredChat => "structured_chat",
            AgentPattern::SelfAsk => "self_ask",
            AgentPattern::OpenaiFunctions => "openai_functions",
        }
    }
}

impl fmt::Display for AgentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        AgentPattern::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| format!("unknown agent pattern '{}'", s))
    }
}

/// How much autonomy the assistant has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    Interactive,
    Autonomous,
    Supervised,
}

impl FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interactive" => Ok(AgentMode::Interactive),
            "autonomous" => Ok(AgentMode::Autonomous),
            "supervised" => Ok(AgentMode::Supervised),
            other => Err(format!("unknown agent mode '{}'", other)),
        }
    }
}

/// How specialist agents report to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollaborationMode {
    Hierarchical,
    PeerToPeer,
}

impl FromStr for CollaborationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "hierarchical" => Ok(CollaborationMode::Hierarchical),
            "peer-to-peer" => Ok(CollaborationMode::PeerToPeer),
            other => Err(format!("unknown collaboration mode '{}'", other)),
        }
    }
}

/// Where embeddings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Gemini embedding model over the network
    Gemini,
    /// Deterministic hashed bag-of-words, no network
    Local,
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(EmbeddingBackend::Gemini),
            "local" | "hash" => Ok(EmbeddingBackend::Local),
            other => Err(format!("unknown embedding backend '{}'", other)),
        }
    }
}

/// Per-pattern tuning
#[derive(Debug, Clone, PartialEq)]
pub struct PatternConfig {
    pub max_iterations: usize,
    pub early_stopping: EarlyStopping,
    /// Wall-clock limit for one query
    pub max_execution_time: Option<Duration>,
    /// Exchanges kept in conversational memory
    pub memory_window: Option<usize>,
}

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub gcp_project_id: Option<String>,
    pub gcp_location: String,
    pub gemini_model: GeminiModel,

    pub default_agent_pattern: AgentPattern,
    pub agent_mode: AgentMode,
    pub max_iterations: usize,
    pub temperature: f32,
    pub max_tokens: u32,

    pub vector_db_path: PathBuf,
    pub collection_name: String,
    pub embedding_model: String,
    pub embedding_backend: EmbeddingBackend,
    pub chunk_size: usize,
    pub chunk_overlap: usize,

    pub collection_interval_hours: u64,
    /// Indexed snapshots older than this are pruned after each background run
    pub data_retention_days: u32,
    pub max_log_entries: usize,
    pub enable_background_collection: bool,

    pub require_confirmation: bool,
    pub safe_mode: bool,
    pub allowed_commands: Vec<String>,

    pub enable_specialist_agents: bool,
    pub agent_collaboration_mode: CollaborationMode,

    pub enable_caching: bool,
    pub cache_ttl_seconds: u64,
    pub cache_dir: PathBuf,
    pub memory_file: PathBuf,

    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gcp_project_id: None,
            gcp_location: "us-central1".to_string(),
            gemini_model: GeminiModel::Gemini20Flash,
            default_agent_pattern: AgentPattern::PlanExecute,
            agent_mode: AgentMode::Interactive,
            max_iterations: 10,
            temperature: 0.1,
            max_tokens: 2048,
            vector_db_path: PathBuf::from("data/vector_db"),
            collection_name: "system_info".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            embedding_backend: EmbeddingBackend::Gemini,
            chunk_size: 1000,
            chunk_overlap: 200,
            collection_interval_hours: 1,
            data_retention_days: 7,
            max_log_entries: 100,
            enable_background_collection: true,
            require_confirmation: true,
            safe_mode: true,
            allowed_commands: ["ps", "top", "free", "df", "uptime", "whoami"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            enable_specialist_agents: true,
            agent_collaboration_mode: CollaborationMode::Hierarchical,
            enable_caching: true,
            cache_ttl_seconds: 300,
            cache_dir: PathBuf::from("data/cache"),
            memory_file: PathBuf::from("data/long_term_memory.json"),
            debug: false,
        }
    }
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            gcp_project_id: get("GCP_PROJECT_ID"),
            gcp_location: get("GCP_LOCATION").unwrap_or(defaults.gcp_location),
            gemini_model: get("GEMINI_MODEL")
                .map(|m| parse_value("GEMINI_MODEL", &m))
                .transpose()?
                .unwrap_or(defaults.gemini_model),
            default_agent_pattern: parse_or("DEFAULT_AGENT_PATTERN", &get, defaults.default_agent_pattern)?,
            agent_mode: parse_or("AGENT_MODE", &get, defaults.agent_mode)?,
            max_iterations: parse_or("MAX_ITERATIONS", &get, defaults.max_iterations)?,
            temperature: parse_or("TEMPERATURE", &get, defaults.temperature)?,
            max_tokens: parse_or("MAX_TOKENS", &get, defaults.max_tokens)?,
            vector_db_path: get("VECTOR_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.vector_db_path),
            collection_name: get("COLLECTION_NAME").unwrap_or(defaults.collection_name),
            embedding_model: get("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_backend: parse_or("EMBEDDING_BACKEND", &get, defaults.embedding_backend)?,
            chunk_size: parse_or("CHUNK_SIZE", &get, defaults.chunk_size)?,
            chunk_overlap: parse_or("CHUNK_OVERLAP", &get, defaults.chunk_overlap)?,
            collection_interval_hours: parse_or(
                "COLLECTION_INTERVAL_HOURS",
                &get,
                defaults.collection_interval_hours,
            )?,
            data_retention_days: parse_or(
                "DATA_RETENTION_DAYS",
                &get,
                defaults.data_retention_days,
            )?,
            max_log_entries: parse_or("MAX_LOG_ENTRIES", &get, defaults.max_log_entries)?,
            enable_background_collection: flag(
                "ENABLE_BACKGROUND_COLLECTION",
                &get,
                defaults.enable_background_collection,
            ),
            require_confirmation: flag("REQUIRE_CONFIRMATION", &get, defaults.require_confirmation),
            safe_mode: flag("SAFE_MODE", &get, defaults.safe_mode),
            allowed_commands: get("ALLOWED_COMMANDS")
                .map(|v| {
                    v.split(',')
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.allowed_commands),
            enable_specialist_agents: flag(
                "ENABLE_SPECIALIST_AGENTS",
                &get,
                defaults.enable_specialist_agents,
            ),
            agent_collaboration_mode: parse_or(
                "AGENT_COLLABORATION_MODE",
                &get,
                defaults.agent_collaboration_mode,
            )?,
            enable_caching: flag("ENABLE_CACHING", &get, defaults.enable_caching),
            cache_ttl_seconds: parse_or("CACHE_TTL_SECONDS", &get, defaults.cache_ttl_seconds)?,
            cache_dir: get("CACHE_DIR").map(PathBuf::from).unwrap_or(defaults.cache_dir),
            memory_file: get("MEMORY_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.memory_file),
            debug: flag("DEBUG", &get, defaults.debug),
        })
    }

    /// Credentials for the chat and embedding endpoints
    ///
    /// An API key wins over a Vertex AI project when both are set.
    pub fn credentials(&self) -> Result<LlmCredentials, LlmError> {
        if let Some(key) = &self.gemini_api_key {
            return Ok(LlmCredentials::ApiKey(key.clone()));
        }
        if let Some(project_id) = &self.gcp_project_id {
            return Ok(LlmCredentials::Vertex {
                project_id: project_id.clone(),
                location: self.gcp_location.clone(),
            });
        }
        Err(LlmError::MissingCredentials)
    }

    /// Generation parameters for agent calls
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::new(self.max_tokens).with_temperature(self.temperature)
    }

    /// Vector collection file
    pub fn collection_path(&self) -> PathBuf {
        self.vector_db_path
            .join(format!("{}.json", self.collection_name))
    }

    /// Tuning for a given pattern
    pub fn pattern_config(&self, pattern: AgentPattern) -> PatternConfig {
        let base = PatternConfig {
            max_iterations: self.max_iterations,
            early_stopping: EarlyStopping::Generate,
            max_execution_time: None,
            memory_window: None,
        };

        match pattern {
            AgentPattern::PlanExecute => PatternConfig {
                max_execution_time: Some(Duration::from_secs(300)),
                ..base
            },
            AgentPattern::Conversational => PatternConfig {
                memory_window: Some(10),
                ..base
            },
            _ => base,
        }
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T, G>(key: &'static str, get: &G, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

/// Only a case-insensitive "true" enables a flag
fn flag<G>(key: &str, get: &G, default: bool) -> bool
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.max_iterations, 10);
        assert_eq!(settings.cache_ttl_seconds, 300);
        assert_eq!(settings.default_agent_pattern, AgentPattern::PlanExecute);
        assert_eq!(settings.allowed_commands.len(), 6);
        assert_eq!(settings.data_retention_days, 7);
        assert!(settings.safe_mode);
        assert_eq!(
            settings.collection_path(),
            PathBuf::from("data/vector_db/system_info.json")
        );
    }

    #[test]
    fn test_overrides_and_flags() {
        let settings = settings_from(&[
            ("MAX_ITERATIONS", "4"),
            ("DATA_RETENTION_DAYS", "30"),
            ("SAFE_MODE", "TRUE"),
            ("REQUIRE_CONFIRMATION", "yes"),
            ("ALLOWED_COMMANDS", "ps, df ,,uptime"),
            ("DEFAULT_AGENT_PATTERN", "multi-agent"),
            ("AGENT_COLLABORATION_MODE", "peer-to-peer"),
            ("EMBEDDING_BACKEND", "local"),
            ("GEMINI_MODEL", "gemini-2.5-flash"),
        ])
        .unwrap();
        assert_eq!(settings.max_iterations, 4);
        assert_eq!(settings.data_retention_days, 30);
        assert!(settings.safe_mode);
        // Only "true" enables a flag
        assert!(!settings.require_confirmation);
        assert_eq!(settings.allowed_commands, vec!["ps", "df", "uptime"]);
        assert_eq!(settings.default_agent_pattern, AgentPattern::MultiAgent);
        assert_eq!(settings.agent_collaboration_mode, CollaborationMode::PeerToPeer);
        assert_eq!(settings.embedding_backend, EmbeddingBackend::Local);
        assert_eq!(settings.gemini_model, GeminiModel::Gemini25Flash);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = settings_from(&[("CHUNK_SIZE", "big")]).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "CHUNK_SIZE");
                assert_eq!(value, "big");
            }
        }
    }

    #[test]
    fn test_credentials_preference() {
        let settings = settings_from(&[("GEMINI_API_KEY", "k"), ("GCP_PROJECT_ID", "p")]).unwrap();
        assert_eq!(
            settings.credentials().unwrap(),
            LlmCredentials::ApiKey("k".to_string())
        );

        let settings = settings_from(&[("GCP_PROJECT_ID", "p")]).unwrap();
        assert_eq!(
            settings.credentials().unwrap(),
            LlmCredentials::Vertex {
                project_id: "p".to_string(),
                location: "us-central1".to_string()
            }
        );

        let settings = settings_from(&[]).unwrap();
        assert!(matches!(
            settings.credentials(),
            Err(LlmError::MissingCredentials)
        ));
    }

    #[test]
    fn test_pattern_config_table() {
        let settings = Settings::default();
        let plan = settings.pattern_config(AgentPattern::PlanExecute);
        assert_eq!(plan.max_execution_time, Some(Duration::from_secs(300)));

        let multi = settings.pattern_config(AgentPattern::MultiAgent);
        assert_eq!(multi.max_execution_time, None);
        assert_eq!(multi.memory_window, None);

        let conv = settings.pattern_config(AgentPattern::Conversational);
        assert_eq!(conv.memory_window, Some(10));

        let react = settings.pattern_config(AgentPattern::React);
        assert_eq!(react.early_stopping, EarlyStopping::Generate);
        assert_eq!(react.max_iterations, 10);
    }

    #[test]
    fn test_pattern_round_trip() {
        for pattern in AgentPattern::ALL {
            assert_eq!(pattern.as_str().parse::<AgentPattern>().unwrap(), pattern);
        }
        assert!("chain_of_thought".parse::<AgentPattern>().is_err());
    }
}
