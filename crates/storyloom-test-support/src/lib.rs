//! Shared test doubles and utilities for the Storyloom turn engine.

mod clock;
mod generation;
mod repository;

pub use clock::FixedClock;
pub use generation::{
    FailingGenerator, FailingSummarizer, RecordingSummarizer, ScriptedGenerator, StallingGenerator,
    StallingSummarizer,
};
pub use repository::{FailingStoryRepository, InMemoryStoryRepository};
