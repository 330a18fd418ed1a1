//! Per-User Serialization Gate
//!
//! One async mutex per phone number, created on first use. Handling of a
//! single inbound message holds the guard for its whole read-branch-act-write
//! sequence; different phones never contend.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Guard held while one message for a phone is being handled
pub type UserGuard = OwnedMutexGuard<()>;

/// Lock table keyed by phone number
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a phone's state
    pub async fn acquire(&self, phone: &str) -> UserGuard {
        let lock = {
            let mut locks = self.locks.lock();
            locks.entry(phone.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of phones with a lock entry
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries nobody holds or waits on.
    ///
    /// Holders and waiters keep their own `Arc` clone, which is only ever
    /// taken under the table lock, so a count of one means idle.
    pub fn prune_idle(&self) -> usize {
        let mut locks = self.locks.lock();
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let pruned = before - locks.len();
        if pruned > 0 {
            debug!("Pruned {} idle user locks", pruned);
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_same_phone_is_exclusive() {
        let locks = UserLocks::new();
        let guard = locks.acquire("3000000000").await;

        let blocked = timeout(Duration::from_millis(50), locks.acquire("3000000000")).await;
        assert!(blocked.is_err(), "second acquire must wait for the first guard");

        drop(guard);
        let reacquired = timeout(Duration::from_millis(50), locks.acquire("3000000000")).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_different_phones_do_not_contend() {
        let locks = UserLocks::new();
        let _a = locks.acquire("3000000001").await;
        let b = timeout(Duration::from_millis(50), locks.acquire("3000000002")).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let locks = UserLocks::new();
        let held = locks.acquire("held").await;
        drop(locks.acquire("idle").await);

        assert_eq!(locks.prune_idle(), 1);
        assert_eq!(locks.len(), 1);
        drop(held);
        assert_eq!(locks.prune_idle(), 1);
        assert!(locks.is_empty());
    }
}
