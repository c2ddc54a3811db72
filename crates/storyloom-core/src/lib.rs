//! Storyloom Core — shared domain types and collaborator contracts.
//!
//! This crate defines the story/node model, the error taxonomy, and the
//! traits the turn engine consumes (persistence, text generation,
//! summarization, time). It contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod generation;
pub mod repository;
pub mod story;
