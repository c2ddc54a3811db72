//! Per-story exclusive execution scopes.
//!
//! Turns on one story must not interleave: prune-then-append reads the tail
//! and rewrites it. Turns on different stories never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of async mutexes keyed by story id.
#[derive(Debug, Clone, Default)]
pub struct StoryLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl StoryLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `story_id`. The guard may be moved
    /// into a spawned task to extend the scope past the caller.
    pub async fn acquire(&self, story_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only the registry still references are idle.
            locks.retain(|id, lock| *id == story_id || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(story_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of stories with a registered lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no lock is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
