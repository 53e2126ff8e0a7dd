//! # Aggregate Locks
//!
//! One async mutex per aggregate id, so two writers never interleave
//! load → mutate → save on the same order.
//!
//! ```text
//! task A: lock(o-1) ── load ── pending() ── save ── unlock
//! task B: lock(o-1) ·····························waits····· load ── ...
//! task C: lock(o-2) ── load ── ... (independent)
//! ```
//!
//! Entries are dropped again once nobody holds or waits for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct LockTable {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one unit of work.
pub struct AggregateGuard<'a> {
    table: &'a LockTable,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other task holds the lock for `key`.
    pub async fn lock(&self, key: &str) -> AggregateGuard<'_> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = mutex.lock_owned().await;
        AggregateGuard {
            table: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for AggregateGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();

        let mut locks = self.table.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map holds the Arc now: nobody is waiting.
        if locks
            .get(&self.key)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            locks.remove(&self.key);
        }
    }
}
