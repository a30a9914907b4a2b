//! Common error types and utilities shared by the event lock crates.

pub mod error;
pub mod utils;

pub use error::{LockError, StoreError};
pub use utils::current_timestamp;
