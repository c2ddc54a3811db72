//! Storyloom Ollama — text generation and summarization over the Ollama
//! `/api/generate` endpoint.

pub mod client;
pub mod summary_prompt;

pub use client::OllamaClient;
