//! Per-name locks for write, rename and delete operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guard holding one or more per-name locks.
///
/// The locks are released when the guard is dropped.
#[derive(Debug)]
pub struct NameGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

/// A set of async mutexes keyed by file name.
///
/// Operations on the same name are serialised; operations on different
/// names run concurrently. Entries nobody holds are pruned on each lock.
#[derive(Debug, Default)]
pub struct NameLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl NameLocks {
    /// Create an empty lock set.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, name: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.retain(|key, lock| key == name || Arc::strong_count(lock) > 1);
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Lock a single name.
    pub async fn lock(&self, name: &str) -> NameGuard {
        let guard = self.entry(name).lock_owned().await;
        NameGuard {
            _guards: vec![guard],
        }
    }

    /// Lock two names at once.
    ///
    /// Names are always acquired in sorted order so two concurrent renames
    /// of the same pair cannot deadlock.
    pub async fn lock_pair(&self, a: &str, b: &str) -> NameGuard {
        if a == b {
            return self.lock(a).await;
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first = self.entry(first).lock_owned().await;
        let second = self.entry(second).lock_owned().await;
        NameGuard {
            _guards: vec![first, second],
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_name_is_serialised() {
        let locks = Arc::new(NameLocks::new());
        let guard = locks.lock("a.txt").await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = locks2.lock("a.txt").await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_names_do_not_block() {
        let locks = NameLocks::new();
        let _a = locks.lock("a.txt").await;

        let b = tokio::time::timeout(Duration::from_millis(200), locks.lock("b.txt")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_lock_pair_same_name() {
        let locks = NameLocks::new();
        let _guard = locks.lock_pair("a.txt", "a.txt").await;
        assert_eq!(locks.tracked(), 1);
    }

    #[tokio::test]
    async fn test_lock_pair_blocks_both_names() {
        let locks = Arc::new(NameLocks::new());
        let guard = locks.lock_pair("b.txt", "a.txt").await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = locks2.lock("b.txt").await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = NameLocks::new();
        for i in 0..10 {
            let _guard = locks.lock(&format!("file{i}.txt")).await;
        }
        let _guard = locks.lock("last.txt").await;
        assert_eq!(locks.tracked(), 1);
    }
}
