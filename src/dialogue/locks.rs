//! Per-user mutual exclusion for session read-modify-write.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Number of lock entries above which idle ones are pruned.
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per user id. Holding the guard serializes every event for
/// that user; different users never contend.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`.
    pub async fn lock(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() >= PRUNE_THRESHOLD {
                prune_idle(&mut locks);
            }
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop entries nobody is holding or waiting on. Returns how many went.
    pub async fn prune(&self) -> usize {
        prune_idle(&mut *self.locks.lock().await)
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

fn prune_idle(locks: &mut HashMap<String, Arc<Mutex<()>>>) -> usize {
    let before = locks.len();
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    before - locks.len()
}
