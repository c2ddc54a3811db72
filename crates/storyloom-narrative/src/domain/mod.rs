//! Pure turn-engine logic. Nothing in here performs I/O.

pub mod commands;
pub mod context;
pub mod prompt;
pub mod rewind;
pub mod summarization;
pub mod turn;
