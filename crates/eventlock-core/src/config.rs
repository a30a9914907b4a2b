//! Lock manager configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Event lock manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLockConfig {
    /// Default lease TTL in milliseconds, used by `acquire` when the caller
    /// does not pick a TTL. Must exceed the expected critical-section
    /// duration with margin: too small and a second holder may acquire while
    /// the first still believes it holds the lock.
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    /// Prefix applied to every lock key inside the shared store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_ttl_ms() -> u64 {
    30_000 // 30 seconds
}

fn default_key_prefix() -> String {
    "eventlock:".to_string()
}

impl Default for EventLockConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: default_ttl_ms(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl EventLockConfig {
    /// Default lease TTL as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EventLockConfig::default();
        assert_eq!(config.default_ttl(), Duration::from_secs(30));
        assert_eq!(config.key_prefix, "eventlock:");
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: EventLockConfig = serde_json::from_str(r#"{"default_ttl_ms": 5000}"#).unwrap();
        assert_eq!(config.default_ttl_ms, 5000);
        assert_eq!(config.key_prefix, "eventlock:");
    }
}
