//! Shared fixtures for the lock protocol tests.

use std::sync::Arc;

use eventlock_core::{EventLockConfig, EventLockManager, MemoryLeaseStore};

/// A shared in-memory lease store plus a factory for managers bound to it,
/// simulating independent workers coordinating through one store.
pub struct LockFixture {
    store: Arc<MemoryLeaseStore>,
}

impl Default for LockFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl LockFixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryLeaseStore::new()),
        }
    }

    /// A manager acting as one independent worker against the shared store.
    pub fn worker(&self) -> EventLockManager {
        EventLockManager::new(self.store.clone(), EventLockConfig::default())
    }

    pub fn store(&self) -> &Arc<MemoryLeaseStore> {
        &self.store
    }
}
