//! Redis/KeyDB lease store backend
//!
//! Implements the `LeaseStore` contract on top of a shared Redis-compatible
//! store: `SET .. PX .. NX` for the atomic conditional create and a Lua
//! script for the atomic owner-checked delete. Lease expiry is native
//! key expiry, so a crashed holder's lease lapses with no extra machinery.

pub mod config;
pub mod store;

pub use config::RedisConfig;
pub use store::RedisLeaseStore;
