//! Storyloom — the turn engine.
//!
//! Maintains each story's token-addressed node sequence: resolves rewinds,
//! selects the context window, assembles prompts, calls the generator, and
//! schedules summarization of older history.

pub mod application;
pub mod domain;
