//! In-memory lease store
//!
//! For tests and single-process deployments. Honors the same atomicity
//! contract as a networked store via per-entry map guards. Expiry is lazy:
//! an expired entry is treated as absent and evicted on the next touch; no
//! background sweep runs.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use eventlock_common::StoreError;

use crate::model::LeaseRecord;
use crate::store::LeaseStore;

struct StoredLease {
    record: LeaseRecord,
    expires_at: Instant,
}

/// In-memory `LeaseStore` implementation
#[derive(Default)]
pub struct MemoryLeaseStore {
    entries: DashMap<String, StoredLease>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) leases currently stored.
    pub fn live_leases(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| entry.expires_at > now)
            .count()
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn put_if_absent(
        &self,
        key: &str,
        record: &LeaseRecord,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let stored = StoredLease {
            record: record.clone(),
            expires_at: now + ttl,
        };

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at <= now {
                    // Expired entry counts as absent
                    occupied.insert(stored);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(stored);
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<LeaseRecord>, StoreError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.record.clone()));
            }
            // Guard must be dropped before removal to avoid deadlocking the shard
            drop(entry);
            self.entries
                .remove_if(key, |_, stored| stored.expires_at <= Instant::now());
        }
        Ok(None)
    }

    async fn delete_if_owner(&self, key: &str, owner_token: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let removed = self.entries.remove_if(key, |_, stored| {
            stored.expires_at > now && stored.record.owner_token == owner_token
        });
        Ok(removed.is_some())
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(token: &str, ttl: Duration) -> LeaseRecord {
        LeaseRecord::new(token, ttl)
    }

    #[tokio::test]
    async fn test_put_if_absent_is_conditional() {
        let store = MemoryLeaseStore::new();
        let ttl = Duration::from_secs(30);

        assert!(
            store
                .put_if_absent("evt-1", &record("a", ttl), ttl)
                .await
                .unwrap()
        );
        assert!(
            !store
                .put_if_absent("evt-1", &record("b", ttl), ttl)
                .await
                .unwrap()
        );

        let current = store.get("evt-1").await.unwrap().unwrap();
        assert_eq!(current.owner_token, "a");
    }

    #[tokio::test]
    async fn test_expired_entry_counts_as_absent() {
        let store = MemoryLeaseStore::new();
        let ttl = Duration::from_millis(20);

        assert!(
            store
                .put_if_absent("evt-1", &record("a", ttl), ttl)
                .await
                .unwrap()
        );
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(store.get("evt-1").await.unwrap().is_none());
        assert!(
            store
                .put_if_absent("evt-1", &record("b", ttl), Duration::from_secs(5))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_delete_if_owner_checks_token() {
        let store = MemoryLeaseStore::new();
        let ttl = Duration::from_secs(30);

        store
            .put_if_absent("evt-1", &record("a", ttl), ttl)
            .await
            .unwrap();

        assert!(!store.delete_if_owner("evt-1", "b").await.unwrap());
        assert!(store.get("evt-1").await.unwrap().is_some());

        assert!(store.delete_if_owner("evt-1", "a").await.unwrap());
        assert!(store.get("evt-1").await.unwrap().is_none());

        // Deleting an absent key is not an error
        assert!(!store.delete_if_owner("evt-1", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_if_owner_ignores_expired_lease() {
        let store = MemoryLeaseStore::new();
        let ttl = Duration::from_millis(20);

        store
            .put_if_absent("evt-1", &record("a", ttl), ttl)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(!store.delete_if_owner("evt-1", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_live_leases() {
        let store = MemoryLeaseStore::new();
        let ttl = Duration::from_secs(30);

        store
            .put_if_absent("evt-1", &record("a", ttl), ttl)
            .await
            .unwrap();
        store
            .put_if_absent("evt-2", &record("b", ttl), ttl)
            .await
            .unwrap();
        assert_eq!(store.live_leases(), 2);

        store.delete_if_owner("evt-1", "a").await.unwrap();
        assert_eq!(store.live_leases(), 1);
    }
}
