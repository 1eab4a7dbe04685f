//! Interactive shell
//!
//! [`App`] wires settings, the model, the vector store and the tools together;
//! [`Shell`] drives the read-eval loop on top of it.

mod app;
mod console;
mod questions;
mod render;
mod shell;
mod suggestions;

use thiserror::Error;

use crate::knowledge::KnowledgeError;
use crate::llm::{LlmError, RegistryError};
use crate::patterns::PatternError;
use crate::storage::StorageError;

pub use app::{embedder, spawn_background_collection, App, Indexer, RETRY_DELAY};
pub use console::Console;
pub use questions::{resolve_question, CATEGORIES, QUESTION_COUNT};
pub use render::{panel, patterns_table, questions_table, steps_panel, welcome};
pub use shell::Shell;
pub use suggestions::contextual_suggestions;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
