//! Gemini provider implementation
//!
//! Streams `generateContent` responses over SSE and exposes the embedding endpoints used
//! by the knowledge base.

pub mod client;
pub mod embeddings;
pub mod mapper;
pub mod sse;
pub mod types;

pub use client::{GeminiClient, GeminiEndpoint, GeminiModel};
pub use embeddings::GeminiEmbedder;
