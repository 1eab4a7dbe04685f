//! LLM Abstraction Layer
//!
//! This module provides a unified interface for talking to Google Gemini models,
//! either through the Generative Language API (API key) or Vertex AI (ADC).

pub mod agent;
pub mod auth;
pub mod core;
pub mod gemini;
pub mod tools;

// Re-export commonly used types
pub use agent::{Agent, AgentError, AgentEvent, AgentRun, EarlyStopping};
pub use core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{collect_text, create_provider, LlmCredentials, LlmProvider},
    types::{
        ContentBlock, ContentDelta, FinishReason, GenerateRequest, Message, MessageRole,
        StreamEvent, ToolDeclaration, UsageMetadata,
    },
};
pub use gemini::GeminiModel;

pub use tools::{FunctionRegistry, RegistryError, ToolExecutor};
