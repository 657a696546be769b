// In-memory per-record locks serializing game actions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as ActionMutex, OwnedMutexGuard};

use crate::db::Scope;

/// Key for the lock map: (scope key, user_id).
type LockKey = (String, i64);

/// Idle entries are swept once the map grows past this.
const SWEEP_THRESHOLD: usize = 1024;

/// Registry of async locks, one per pig record. Holding a record's lock
/// serializes the read-decide-write cycle of an action against every
/// other action on the same record.
#[derive(Debug, Clone)]
pub struct RecordLocks {
    inner: Arc<Mutex<HashMap<LockKey, Arc<ActionMutex<()>>>>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Acquire the lock for one record, creating it on first use.
    pub async fn lock(&self, scope: &Scope, user_id: i64) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().unwrap();
            if map.len() >= SWEEP_THRESHOLD {
                // Entries only referenced by the map itself are idle.
                map.retain(|_, m| Arc::strong_count(m) > 1);
            }
            map.entry((scope.key(), user_id))
                .or_insert_with(|| Arc::new(ActionMutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }

    /// Acquire the locks of two distinct records. Lock order follows the
    /// user ids, so concurrent duels between the same pair cannot
    /// deadlock no matter which side initiated.
    pub async fn lock_pair(
        &self,
        scope: &Scope,
        a: i64,
        b: i64,
    ) -> (OwnedMutexGuard<()>, OwnedMutexGuard<()>) {
        debug_assert!(a != b, "lock_pair needs two distinct records");
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let first = self.lock(scope, lo).await;
        let second = self.lock(scope, hi).await;
        (first, second)
    }

    /// Number of lock entries currently tracked (for testing/diagnostics).
    pub fn tracked(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

impl Default for RecordLocks {
    fn default() -> Self {
        Self::new()
    }
}
