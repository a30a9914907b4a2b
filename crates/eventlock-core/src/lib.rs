//! Eventlock Core - lease-based mutual exclusion for betting events
//!
//! This crate provides:
//! - The lease lock data model (`LeaseRecord`, `LockInfo`, contention events)
//! - The `LeaseStore` trait (the networked source of truth, consumed as an
//!   interface) and an in-memory implementation
//! - `EventLockManager`: the acquire/release/inspect protocol
//! - `ContentionMonitor`: contention statistics and the event stream
//!
//! The manager guarantees at most one holder per key across any number of
//! independent workers, bounded in time by a lease. All serialization
//! authority is delegated to the store's atomic conditional write and
//! conditional delete; the manager itself only caches the owner token of its
//! own most recent acquisition so its release is owner-safe.

pub mod config;
pub mod manager;
pub mod model;
pub mod monitor;
pub mod store;

// Re-export commonly used types
pub use config::EventLockConfig;
pub use manager::EventLockManager;
pub use model::{
    ContentionEvent, ContentionKind, KeyContentionStats, LeaseRecord, LockInfo, LockManagerStats,
};
pub use monitor::ContentionMonitor;
pub use store::{LeaseStore, MemoryLeaseStore};

// Re-export the shared error types at the crate root
pub use eventlock_common::{LockError, StoreError};
