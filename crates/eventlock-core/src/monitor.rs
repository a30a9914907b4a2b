//! Contention monitoring
//!
//! Aggregates contention events into diagnosable statistics without
//! affecting correctness of the lock manager. Everything here is infallible
//! by construction: a broken dashboard must never be able to break the
//! mutual-exclusion guarantee.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::{ContentionEvent, ContentionKind, KeyContentionStats, LockManagerStats};

const EVENT_STREAM_CAPACITY: usize = 256;

#[derive(Default)]
struct KeyCounters {
    attempts: AtomicU64,
    failures: AtomicU64,
    // 0 = never contended
    last_contention_at: AtomicI64,
}

#[derive(Default)]
struct TotalCounters {
    total_acquisitions: AtomicU64,
    failed_acquisitions: AtomicU64,
    total_releases: AtomicU64,
    stale_releases: AtomicU64,
}

/// Observes failed-acquisition and expiry events emitted by the lock manager
/// and aggregates them into per-key and global statistics.
pub struct ContentionMonitor {
    keys: DashMap<String, KeyCounters>,
    totals: TotalCounters,
    events: broadcast::Sender<ContentionEvent>,
}

impl Default for ContentionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentionMonitor {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_STREAM_CAPACITY);
        Self {
            keys: DashMap::new(),
            totals: TotalCounters::default(),
            events,
        }
    }

    /// Record an acquire attempt for a key.
    pub fn record_attempt(&self, key: &str) {
        self.keys
            .entry(key.to_string())
            .or_default()
            .attempts
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful acquisition.
    pub fn record_acquired(&self) {
        self.totals
            .total_acquisitions
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful owner-checked release.
    pub fn record_released(&self) {
        self.totals.total_releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a contention event. Never fails; delivery to subscribers is
    /// best-effort and lagging receivers are dropped by the channel.
    pub fn record(&self, event: ContentionEvent) {
        let counters = self.keys.entry(event.key.clone()).or_default();
        counters
            .last_contention_at
            .store(event.timestamp, Ordering::Relaxed);

        match event.kind {
            ContentionKind::AcquireFailed => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
                self.totals
                    .failed_acquisitions
                    .fetch_add(1, Ordering::Relaxed);
            }
            ContentionKind::LeaseExpiredUnreleased => {
                self.totals.stale_releases.fetch_add(1, Ordering::Relaxed);
            }
        }
        drop(counters);

        debug!(
            key = %event.key,
            kind = ?event.kind,
            timestamp = event.timestamp,
            "contention event"
        );

        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Read-only snapshot of contention stats for one key.
    pub fn stats_for(&self, key: &str) -> KeyContentionStats {
        match self.keys.get(key) {
            Some(counters) => {
                let last = counters.last_contention_at.load(Ordering::Relaxed);
                KeyContentionStats {
                    attempts: counters.attempts.load(Ordering::Relaxed),
                    failures: counters.failures.load(Ordering::Relaxed),
                    last_contention_at: (last != 0).then_some(last),
                }
            }
            None => KeyContentionStats::default(),
        }
    }

    /// Global aggregate statistics.
    pub fn stats(&self) -> LockManagerStats {
        LockManagerStats {
            total_acquisitions: self.totals.total_acquisitions.load(Ordering::Relaxed),
            failed_acquisitions: self.totals.failed_acquisitions.load(Ordering::Relaxed),
            total_releases: self.totals.total_releases.load(Ordering::Relaxed),
            stale_releases: self.totals.stale_releases.load(Ordering::Relaxed),
        }
    }

    /// Subscribe to the live stream of contention events.
    pub fn subscribe(&self) -> broadcast::Receiver<ContentionEvent> {
        self.events.subscribe()
    }
}
