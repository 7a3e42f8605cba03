//! # Owner Locks
//!
//! Serializes state-changing operations per owner.
//!
//! Swaps, stakes, unstakes and claims for the same owner run one at a time;
//! different owners proceed in parallel. The guard is held across the whole
//! operation, including its awaits. An owner's entry is dropped from the
//! table once its last guard is released and nobody is waiting on it.

use crate::domain::value_objects::WalletAddress;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = HashMap<WalletAddress, Arc<AsyncMutex<()>>>;

/// Per-owner async mutexes.
#[derive(Debug, Default)]
pub struct OwnerLocks {
    locks: Mutex<LockTable>,
}

impl OwnerLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `owner`.
    pub async fn acquire(&self, owner: &WalletAddress) -> OwnerGuard<'_> {
        let lock = {
            let mut locks = self.table();
            Arc::clone(locks.entry(owner.clone()).or_default())
        };
        OwnerGuard {
            locks: self,
            owner: owner.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of owners currently locked or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table().len()
    }

    /// Returns true if no owner is locked or waited on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> std::sync::MutexGuard<'_, LockTable> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, owner: &WalletAddress) {
        let mut locks = self.table();
        // The table's own reference is the only one left: no holder, no waiter.
        if locks.get(owner).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(owner);
        }
    }
}

/// Exclusive access to one owner, released on drop.
#[derive(Debug)]
#[must_use = "the owner is unlocked as soon as the guard is dropped"]
pub struct OwnerGuard<'a> {
    locks: &'a OwnerLocks,
    owner: WalletAddress,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.owner);
    }
}
