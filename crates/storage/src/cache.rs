//! Key-value cache for serialized attempt lists.
//!
//! Registrations never write new data here: they bump the version of the
//! event they touched and the next read recomputes the list under the new
//! version's key.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::error::Result;

/// How long a cached attempt list lives (7 days).
pub const PARTICIPATIONS_TTL_SECS: u64 = 3600 * 24 * 7;

/// Key holding the current version of an event's attempt list.
pub fn participations_version_key(event_id: i32) -> String {
    format!("participations:{event_id}:version")
}

/// Cache key of one version of the attempt list of an event.
pub fn participations_key(event_id: i32, version: i64) -> String {
    format!("participations:{event_id}:v{version}")
}

#[async_trait]
pub trait AttemptCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Atomically increments an integer key (missing counts as 0).
    async fn incr(&self, key: &str) -> Result<i64>;
}

/// Versioned attempt lists of events.
///
/// Every write bumps the event's version, so a list computed before the bump
/// can only land under a key that no later read looks up.
pub struct ParticipationsCache<'a> {
    cache: &'a dyn AttemptCache,
}

impl<'a> ParticipationsCache<'a> {
    pub fn new(cache: &'a dyn AttemptCache) -> Self {
        Self { cache }
    }

    /// Key of the list readers should use right now.
    pub async fn current_key(&self, event_id: i32) -> Result<String> {
        let version = self
            .cache
            .get(&participations_version_key(event_id))
            .await?
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        Ok(participations_key(event_id, version))
    }

    /// Moves readers to a fresh key and drops the previous list.
    pub async fn invalidate(&self, event_id: i32) -> Result<()> {
        let version = self
            .cache
            .incr(&participations_version_key(event_id))
            .await?;
        self.cache
            .delete(&participations_key(event_id, version - 1))
            .await
    }
}

/// Redis-backed cache sharing one multiplexed connection.
#[derive(Clone)]
pub struct RedisCache {
    conn_manager: ConnectionManager,
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let conn_manager = ConnectionManager::new(client).await?;
        Ok(Self { conn_manager })
    }
}

#[async_trait]
impl AttemptCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn_manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn.del(key).await?;
        tracing::debug!(key, "Dropped cached attempt list");
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn_manager.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }
}
