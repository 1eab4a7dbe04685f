//! AI-assisted system administration toolkit
//!
//! Collects host snapshots into a local vector store and answers questions about the
//! machine through several LLM agent patterns that can call system tools.

// Lets `#[tool]`-generated code refer to `sysadmin_agent::...` from inside this crate.
extern crate self as sysadmin_agent;

// LLM abstraction layer
pub mod llm;

// Host inspection, knowledge base and persistence
pub mod cache;
pub mod config;
pub mod knowledge;
pub mod memory;
pub mod storage;
pub mod system;

// Agent tools and reasoning patterns
pub mod patterns;
pub mod tools;

// Interactive shell
pub mod cli;
