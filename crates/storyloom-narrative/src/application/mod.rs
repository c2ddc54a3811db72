//! Application layer: the orchestrator that drives turns against the
//! persistence and generation collaborators.

pub mod command_handlers;
pub mod locks;
pub mod orchestrator;
pub mod query_handlers;
