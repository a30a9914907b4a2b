//! `LeaseStore` implementation over a fred connection pool

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fred::clients::Pool;
use fred::interfaces::{ClientLike, KeysInterface, LuaInterface};
use fred::types::Builder;
use fred::types::config::{Config, ReconnectPolicy, ServerConfig};
use tracing::{debug, info};

use eventlock_common::StoreError;
use eventlock_core::model::LeaseRecord;
use eventlock_core::store::LeaseStore;

use crate::config::{RedisConfig, parse_host_port};

/// Owner-checked delete. `GET` + token compare + `DEL` must be one atomic
/// step or a stale release could free a lease a later holder owns.
const DELETE_IF_OWNER_SCRIPT: &str = r#"
    local val = redis.call('GET', KEYS[1])
    if val then
        local lease = cjson.decode(val)
        if lease.owner_token == ARGV[1] then
            redis.call('DEL', KEYS[1])
            return 1
        end
    end
    return 0
"#;

/// Redis-backed lease store
pub struct RedisLeaseStore {
    pool: Pool,
    closed: AtomicBool,
}

impl RedisLeaseStore {
    /// Connect to the server described by `config`.
    ///
    /// The pool is initialised (connected + PING verified) before being
    /// returned, so a bad endpoint fails here rather than on first acquire.
    pub async fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        let (host, port) = parse_host_port(&config.endpoint)?;

        let fred_config = Config {
            server: ServerConfig::new_centralized(host, port),
            password: config.password.clone(),
            ..Config::default()
        };

        let mut builder = Builder::from_config(fred_config);
        // Exponential reconnect: initial 0ms, base 100ms, max 30s, factor 2
        builder.set_policy(ReconnectPolicy::new_exponential(0, 100, 30_000, 2));

        let pool = builder.build_pool(config.pool_size).map_err(unavailable)?;
        pool.init().await.map_err(unavailable)?;

        let _: String = pool.ping(None).await.map_err(unavailable)?;

        info!(
            host = host,
            port = port,
            pool_size = config.pool_size,
            "lease store pool created and verified"
        );

        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl LeaseStore for RedisLeaseStore {
    async fn put_if_absent(
        &self,
        key: &str,
        record: &LeaseRecord,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let value = serde_json::to_string(record)?;

        // SET .. PX .. NX replies with "OK" when the key was set, nil otherwise
        let reply: Option<String> = self
            .pool
            .set(
                key,
                value.as_str(),
                Some(fred::types::Expiration::PX(ttl.as_millis() as i64)),
                Some(fred::types::SetOptions::NX),
                false,
            )
            .await
            .map_err(unavailable)?;

        let created = reply.is_some();
        debug!(%key, created, "put_if_absent");
        Ok(created)
    }

    async fn get(&self, key: &str) -> Result<Option<LeaseRecord>, StoreError> {
        let value: Option<String> = self.pool.get(key).await.map_err(unavailable)?;
        match value {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn delete_if_owner(&self, key: &str, owner_token: &str) -> Result<bool, StoreError> {
        let deleted: i64 = self
            .pool
            .eval(
                DELETE_IF_OWNER_SCRIPT,
                vec![key.to_string()],
                vec![owner_token.to_string()],
            )
            .await
            .map_err(unavailable)?;

        debug!(%key, deleted = deleted == 1, "delete_if_owner");
        Ok(deleted == 1)
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.pool.quit().await.map_err(unavailable)?;
        info!("lease store pool closed");
        Ok(())
    }
}

fn unavailable(e: fred::error::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}
