//! Event lock manager
//!
//! Provides an at-most-one-holder guarantee per key, bounded in time by a
//! lease, resilient to holder crashes. Each operation performs exactly one
//! store round trip; there is no internal retry, queueing, or backoff.
//! Callers needing blocking semantics poll `acquire` themselves.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use eventlock_common::LockError;

use crate::config::EventLockConfig;
use crate::model::{ContentionEvent, LeaseRecord, LockInfo};
use crate::monitor::ContentionMonitor;
use crate::store::LeaseStore;

/// Lease-based mutual exclusion over a shared lease store.
///
/// Safe for concurrent use by multiple callers within one process. The
/// manager holds no authoritative lock state; it only caches the owner token
/// of its own most recent successful acquire per key, so that its release is
/// owner-checked and can never free a lease a different holder legitimately
/// acquired after a TTL lapse.
pub struct EventLockManager {
    store: Arc<dyn LeaseStore>,
    monitor: Arc<ContentionMonitor>,
    /// key -> owner token of this manager's most recent successful acquire
    owned: DashMap<String, String>,
    default_ttl: Duration,
    key_prefix: String,
}

impl EventLockManager {
    pub fn new(store: Arc<dyn LeaseStore>, config: EventLockConfig) -> Self {
        Self::with_monitor(store, Arc::new(ContentionMonitor::new()), config)
    }

    /// Build with a shared monitor (e.g. one monitor observing several
    /// managers feeding one dashboard).
    pub fn with_monitor(
        store: Arc<dyn LeaseStore>,
        monitor: Arc<ContentionMonitor>,
        config: EventLockConfig,
    ) -> Self {
        Self {
            store,
            monitor,
            owned: DashMap::new(),
            default_ttl: config.default_ttl(),
            key_prefix: config.key_prefix,
        }
    }

    pub fn monitor(&self) -> &Arc<ContentionMonitor> {
        &self.monitor
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Attempt to acquire the lease for `key` with the configured default
    /// TTL. Single, immediate, non-blocking attempt.
    pub async fn acquire(&self, key: &str) -> Result<bool, LockError> {
        self.acquire_with_ttl(key, self.default_ttl).await
    }

    /// Attempt to acquire the lease for `key` with an explicit TTL.
    ///
    /// Returns `Ok(true)` and records a fresh owner token locally if the
    /// store reports the write as newly created; returns `Ok(false)` without
    /// side effects on the store if the key is already held. A store error
    /// means lock state is unknown and the caller must not enter its
    /// critical section.
    pub async fn acquire_with_ttl(&self, key: &str, ttl: Duration) -> Result<bool, LockError> {
        if key.is_empty() {
            return Err(LockError::EmptyKey);
        }
        if ttl.is_zero() {
            return Err(LockError::InvalidTtl);
        }

        self.monitor.record_attempt(key);

        let token = Uuid::new_v4().to_string();
        let record = LeaseRecord::new(&token, ttl);
        let created = self
            .store
            .put_if_absent(&self.storage_key(key), &record, ttl)
            .await?;

        if created {
            self.owned.insert(key.to_string(), token);
            self.monitor.record_acquired();
            debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "lease acquired");
        } else {
            self.monitor.record(ContentionEvent::acquire_failed(key));
            debug!(key = %key, "acquire failed, key already leased");
        }

        Ok(created)
    }

    /// Release the lease for `key` if this manager still holds it.
    ///
    /// The delete is owner-checked against the token from the most recent
    /// successful acquire, never unconditional. Releasing a lease that was
    /// never held here, already released, or already expired is a silent
    /// no-op; release never fails the caller except on store errors.
    pub async fn release(&self, key: &str) -> Result<(), LockError> {
        if key.is_empty() {
            return Err(LockError::EmptyKey);
        }

        let Some((_, token)) = self.owned.remove(key) else {
            return Ok(());
        };

        match self
            .store
            .delete_if_owner(&self.storage_key(key), &token)
            .await
        {
            Ok(true) => {
                self.monitor.record_released();
                debug!(key = %key, "lease released");
                Ok(())
            }
            Ok(false) => {
                // The lease lapsed via TTL (or a later holder owns the key
                // now); the only correct move is to leave the store alone.
                self.monitor
                    .record(ContentionEvent::lease_expired_unreleased(key));
                warn!(key = %key, "lease expired or reassigned before release");
                Ok(())
            }
            Err(e) => {
                // Keep the token so a retried release stays owner-checked.
                // If a fresher acquire raced in while the delete reply was
                // in flight, its token wins over this stale one.
                self.owned.entry(key.to_string()).or_insert(token);
                Err(e.into())
            }
        }
    }

    /// Read the current lease state for `key`. Pure read: no side effects,
    /// no ownership implications. Reflects store-side TTL, so `locked` flips
    /// to `false` on its own once the lease expires.
    pub async fn get_lock_info(&self, key: &str) -> Result<LockInfo, LockError> {
        if key.is_empty() {
            return Err(LockError::EmptyKey);
        }

        let info = match self.store.get(&self.storage_key(key)).await? {
            Some(record) if !record.is_expired() => LockInfo::held(&record),
            _ => LockInfo::unlocked(),
        };
        Ok(info)
    }

    /// Release the store connection resource. Does NOT release held leases;
    /// they expire naturally via TTL, which is the deliberate recovery path
    /// for crashed holders.
    pub async fn close(&self) -> Result<(), LockError> {
        self.owned.clear();
        self.store.close().await?;
        Ok(())
    }
}
