// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-key async mutual exclusion.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

/// A family of async mutexes, one per key, created on first use.
///
/// Holders of different keys never contend. Entries are never evicted;
/// keys are expected to come from a small, slowly growing set (app names,
/// tool/architecture pairs).
pub struct KeyedLocks<K> {
    inner: Arc<Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>>,
}

impl<K> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl<K: Eq + Hash> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let mutex = Arc::clone(self.inner.lock().entry(key).or_default());
        mutex.lock_owned().await
    }
}

#[cfg(test)]
#[path = "keyed_lock_tests.rs"]
mod tests;
