//! Redis connection configuration

use serde::{Deserialize, Serialize};

use eventlock_common::StoreError;

/// Redis/KeyDB connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Server endpoint, e.g. `redis://127.0.0.1:6379` or `host:port`.
    /// A `redis://`/`rediss://` scheme prefix is tolerated and stripped.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Optional AUTH password
    #[serde(default)]
    pub password: Option<String>,

    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_endpoint() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_pool_size() -> usize {
    4
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            password: None,
            pool_size: default_pool_size(),
        }
    }
}

/// Parse a `host:port` string. If the port is omitted, defaults to `6379`.
pub(crate) fn parse_host_port(endpoint: &str) -> Result<(&str, u16), StoreError> {
    let endpoint = endpoint
        .trim_start_matches("rediss://")
        .trim_start_matches("redis://");
    let endpoint = endpoint.split('/').next().unwrap_or(endpoint);

    match endpoint.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                StoreError::Unavailable(format!("invalid port in endpoint '{}'", endpoint))
            })?;
            Ok((host, port))
        }
        None => Ok((endpoint, 6379)),
    }
}
