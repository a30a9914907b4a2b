//! Error types for the event lock manager
//!
//! This module defines:
//! - `StoreError`: failures surfaced by a lease store backend
//! - `LockError`: failures surfaced by the lock manager to its callers

/// Lease store backend errors
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("lease store unavailable: {0}")]
    Unavailable(String),

    #[error("lease record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("lease store connection closed")]
    Closed,
}

/// Lock manager errors
#[derive(thiserror::Error, Debug)]
pub enum LockError {
    #[error("lock key must not be empty")]
    EmptyKey,

    #[error("lease ttl must be greater than zero")]
    InvalidTtl,

    #[error("lease store error: {0}")]
    Store(#[from] StoreError),
}
