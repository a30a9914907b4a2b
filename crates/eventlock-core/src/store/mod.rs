//! Lease store abstraction
//!
//! The store is the single source of truth for which key is currently
//! leased. Correctness of the whole lock protocol rests on the atomicity of
//! its conditional write and conditional delete; the lock manager holds no
//! authoritative state of its own.

mod memory;

pub use memory::MemoryLeaseStore;

use std::time::Duration;

use async_trait::async_trait;

use eventlock_common::StoreError;

use crate::model::LeaseRecord;

/// A networked key-value store used as the source of truth for lease state.
///
/// Any store offering an atomic "set if absent with expiry" and an atomic
/// "delete only if value matches" satisfies this contract.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Atomically create the lease at `key` with the given expiry, succeeding
    /// only if the key is absent. Returns `true` iff the record was newly
    /// created.
    async fn put_if_absent(
        &self,
        key: &str,
        record: &LeaseRecord,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Read the current lease record at `key`, if any. Expired records are
    /// reported as absent.
    async fn get(&self, key: &str) -> Result<Option<LeaseRecord>, StoreError>;

    /// Atomically delete the lease at `key` only if it is still owned by
    /// `owner_token`. Returns `true` iff a record was deleted.
    async fn delete_if_owner(&self, key: &str, owner_token: &str) -> Result<bool, StoreError>;

    /// Release the underlying connection resource. Idempotent; does not
    /// touch any stored leases (they lapse via TTL).
    async fn close(&self) -> Result<(), StoreError>;
}
