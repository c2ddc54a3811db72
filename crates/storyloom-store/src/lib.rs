//! Storyloom Store — PostgreSQL persistence for stories and their nodes.

pub mod pg_story_repository;

/// Embedded schema migrations, shared by the server and the database tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
