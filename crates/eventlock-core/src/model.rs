//! Lease lock data model

use std::time::Duration;

use serde::{Deserialize, Serialize};

use eventlock_common::current_timestamp;

/// The value stored at a lock key while the lease is held.
///
/// A record is created only by a successful acquire and destroyed either by
/// an owner-checked release or by the store's own TTL expiry. Records are
/// never mutated in place; every acquisition writes a fresh owner token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// Token unique per acquisition attempt, regenerated on every successful
    /// acquire (not per process)
    pub owner_token: String,
    /// Acquisition timestamp (Unix millis)
    pub acquired_at: i64,
    /// Lease duration at acquisition time, in milliseconds
    pub ttl_ms: u64,
}

impl LeaseRecord {
    /// Create a record acquired now with the given TTL.
    pub fn new(owner_token: impl Into<String>, ttl: Duration) -> Self {
        Self {
            owner_token: owner_token.into(),
            acquired_at: current_timestamp(),
            ttl_ms: ttl.as_millis() as u64,
        }
    }

    /// Expiration timestamp (Unix millis).
    pub fn expires_at(&self) -> i64 {
        self.acquired_at + self.ttl_ms as i64
    }

    /// Check if the lease has expired.
    pub fn is_expired(&self) -> bool {
        current_timestamp() >= self.expires_at()
    }

    /// Remaining lease time; zero once expired.
    pub fn remaining_ttl(&self) -> Duration {
        let now = current_timestamp();
        let expires_at = self.expires_at();
        if expires_at > now {
            Duration::from_millis((expires_at - now) as u64)
        } else {
            Duration::ZERO
        }
    }
}

/// Read-only projection of the current lease state at a key.
///
/// Derived entirely from the current `LeaseRecord` (or its absence); never
/// independently persisted. `owner_token` and `remaining_ttl_ms` are only
/// meaningful when `locked == true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockInfo {
    /// Whether the key is currently leased
    pub locked: bool,
    /// Owner token of the current lease
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_token: Option<String>,
    /// Remaining lease time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ttl_ms: Option<u64>,
}

impl LockInfo {
    /// Projection for an unleased (or expired) key.
    pub fn unlocked() -> Self {
        Self {
            locked: false,
            owner_token: None,
            remaining_ttl_ms: None,
        }
    }

    /// Projection for a currently held lease.
    pub fn held(record: &LeaseRecord) -> Self {
        Self {
            locked: true,
            owner_token: Some(record.owner_token.clone()),
            remaining_ttl_ms: Some(record.remaining_ttl().as_millis() as u64),
        }
    }
}

/// Kind of contention observed by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentionKind {
    /// An acquire attempt found the key already held
    AcquireFailed,
    /// A lease lapsed via TTL before its holder released it
    LeaseExpiredUnreleased,
}

/// Ephemeral contention record emitted for observability.
///
/// Not persisted beyond the process lifetime of the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentionEvent {
    /// The contended lock key
    pub key: String,
    /// Event timestamp (Unix millis)
    pub timestamp: i64,
    /// What happened
    pub kind: ContentionKind,
}

impl ContentionEvent {
    pub fn acquire_failed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            timestamp: current_timestamp(),
            kind: ContentionKind::AcquireFailed,
        }
    }

    pub fn lease_expired_unreleased(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            timestamp: current_timestamp(),
            kind: ContentionKind::LeaseExpiredUnreleased,
        }
    }
}

/// Per-key contention snapshot for dashboards and alerts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyContentionStats {
    /// Acquire attempts for this key
    pub attempts: u64,
    /// Failed acquisitions (lock contention)
    pub failures: u64,
    /// Timestamp of the most recent contention event (Unix millis)
    pub last_contention_at: Option<i64>,
}

/// Global lock manager statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LockManagerStats {
    /// Total successful acquisitions
    pub total_acquisitions: u64,
    /// Failed acquisitions (lock contention)
    pub failed_acquisitions: u64,
    /// Total owner-checked releases
    pub total_releases: u64,
    /// Releases that found the lease already expired or reassigned
    pub stale_releases: u64,
}
