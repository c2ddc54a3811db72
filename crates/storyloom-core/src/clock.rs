//! Time source used to stamp stories and nodes.

use chrono::{DateTime, Utc};

/// Source of "now" for story and node timestamps.
///
/// Injected into the turn engine so tests can pin timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used by the server binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
