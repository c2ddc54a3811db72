//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use storyloom_narrative::application::orchestrator::EngineConfig;
use storyloom_narrative::domain::context::DEFAULT_CONTEXT_WINDOW;
use storyloom_narrative::domain::summarization::DEFAULT_SUMMARY_INTERVAL;

use crate::error::AppError;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "mistral:7b-instruct";

/// Runtime configuration for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Pool size.
    pub database_max_connections: u32,
    /// Base URL of the Ollama server.
    pub ollama_url: String,
    /// Ollama model tag.
    pub ollama_model: String,
    /// Per-call limit for generation and summarization.
    pub generation_timeout: Duration,
    /// Summarize every this many nodes.
    pub summary_interval: usize,
    /// Recent nodes kept next to the summary.
    pub context_window: usize,
    /// OTLP collector endpoint; span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("DATABASE_URL environment variable must be set".to_owned())
            })?;

        let summary_interval = parse_or(&lookup, "SUMMARY_INTERVAL", DEFAULT_SUMMARY_INTERVAL)?;
        let context_window = parse_or(&lookup, "CONTEXT_WINDOW_NODES", DEFAULT_CONTEXT_WINDOW)?;
        if summary_interval == 0 || context_window == 0 {
            return Err(AppError::Config(
                "SUMMARY_INTERVAL and CONTEXT_WINDOW_NODES must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parse_or(&lookup, "PORT", 3000)?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            ollama_url: lookup("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_owned()),
            ollama_model: lookup("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_owned()),
            generation_timeout: Duration::from_secs(parse_or(
                &lookup,
                "GENERATION_TIMEOUT_SECS",
                60,
            )?),
            summary_interval,
            context_window,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a valid address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Engine tuning derived from this configuration.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            summary_interval: self.summary_interval,
            context_window: self.context_window,
            generation_timeout: self.generation_timeout,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
    }
}
