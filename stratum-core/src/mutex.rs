//! Keyed mutual exclusion
//!
//! Some control-plane mutations are unsafe to run concurrently against the same
//! remote object even though the service offers no locking of its own (updating
//! member features of one GuardDuty detector, creating ENIs for VPC-attached
//! models). [`KeyedMutex`] serializes those operations client-side: one lock per
//! key, created on first use and kept for the lifetime of the registry.
//!
//! Create one registry per provider process and share it by `Arc`.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of named locks
#[derive(Debug, Default)]
pub struct KeyedMutex {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock for `key`, created atomically if this is the first use
    fn entry(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(key) {
            return Arc::clone(lock.value());
        }
        Arc::clone(&self.locks.entry(key.to_string()).or_default())
    }

    /// Wait until the caller holds the lock for `key`
    ///
    /// The lock is released when the returned guard is dropped or
    /// [`KeyedGuard::release`] is called. Only the guard can release it.
    pub async fn lock(&self, key: &str) -> KeyedGuard {
        let lock = self.entry(key);
        let guard = match Arc::clone(&lock).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("waiting for lock '{}'", key);
                lock.lock_owned().await
            }
        };

        KeyedGuard {
            key: Some(key.to_string()),
            guard: Some(guard),
        }
    }

    /// Lock `key` only when `condition` holds; otherwise return a guard that
    /// releases nothing
    pub async fn lock_if(&self, condition: bool, key: &str) -> KeyedGuard {
        if condition {
            self.lock(key).await
        } else {
            KeyedGuard::skipped()
        }
    }

    /// Number of keys that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Scoped hold on one key of a [`KeyedMutex`]
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct KeyedGuard {
    key: Option<String>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedGuard {
    /// Guard for an acquisition that was skipped
    pub fn skipped() -> Self {
        Self {
            key: None,
            guard: None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    /// Release early; calling it again, or on a skipped guard, is a no-op
    pub fn release(&mut self) {
        if self.guard.take().is_some()
            && let Some(key) = &self.key
        {
            debug!("released lock '{}'", key);
        }
    }
}
