//! Keyed async locks for per-entity serialization.
//!
//! Status transitions are serialized per load and HOS close/open per driver.
//! The registry hands out one async mutex per key; guards are owned so they
//! can be held across await points.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry size at which released locks get swept.
const PRUNE_AT: usize = 1024;

#[derive(Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, waiting if another task holds it.
    pub async fn acquire(&self, key: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if map.len() >= PRUNE_AT {
                // Held or awaited locks have clones outside the map.
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            map.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}
