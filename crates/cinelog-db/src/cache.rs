//! Redis session cache
//!
//! Sessions are stored as JSON under `session:<id>` with a fixed TTL. Reads
//! use `GETEX ... EX` so fetching a session and extending its lifetime is a
//! single atomic command.

use std::time::Duration;

use async_trait::async_trait;
use cinelog_types::{Session, SessionId};
use deadpool_redis::{Config as PoolConfig, Pool, Runtime};
use redis::AsyncCommands;

use crate::error::{DbError, DbResult};
use crate::repo::SessionCache;
use crate::timeout::with_timeout;

/// Default sliding lifetime of a session
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);
/// Default deadline for a cache round trip
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(1);

/// Redis-backed session cache with connection pooling
#[derive(Clone)]
pub struct RedisSessionCache {
    pool: Pool,
    ttl: Duration,
    timeout: Duration,
    key_prefix: String,
}

impl RedisSessionCache {
    /// Create a session cache for the given Redis URL
    pub fn new(connection_url: impl Into<String>) -> DbResult<Self> {
        let pool = PoolConfig::from_url(connection_url.into())
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| DbError::Config(format!("failed to create Redis pool: {e}")))?;

        Ok(Self::from_pool(pool))
    }

    /// Create a session cache on an existing pool
    pub fn from_pool(pool: Pool) -> Self {
        Self {
            pool,
            ttl: DEFAULT_SESSION_TTL,
            timeout: DEFAULT_CACHE_TIMEOUT,
            key_prefix: "session".to_string(),
        }
    }

    /// Set the sliding lifetime applied on create and on every read
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the deadline for each cache round trip
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the key namespace
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Get the connection pool
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    fn build_key(&self, id: &SessionId) -> String {
        if self.key_prefix.is_empty() {
            id.as_str().to_string()
        } else {
            format!("{}:{}", self.key_prefix, id)
        }
    }

    fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }

    async fn set(&self, key: String, payload: Vec<u8>) -> DbResult<()> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.set_ex(key, payload, self.ttl_secs()).await?;
        Ok(())
    }

    async fn get_ex(&self, key: String) -> DbResult<Option<Vec<u8>>> {
        let mut conn = self.pool.get().await?;
        let value: Option<Vec<u8>> = redis::cmd("GETEX")
            .arg(key)
            .arg("EX")
            .arg(self.ttl_secs())
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn del(&self, key: String) -> DbResult<()> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn create(&self, session: &Session) -> DbResult<()> {
        let payload = serde_json::to_vec(session)?;
        let key = self.build_key(&session.id);
        with_timeout(self.timeout, "session write", self.set(key, payload)).await
    }

    async fn read_and_refresh(&self, id: &SessionId) -> DbResult<Session> {
        let key = self.build_key(id);
        let payload = with_timeout(self.timeout, "session read", self.get_ex(key))
            .await?
            .ok_or(DbError::NotFound)?;

        // An undecodable entry cannot identify anyone; treat it as absent
        serde_json::from_slice(&payload).map_err(|e| {
            tracing::warn!(error = %e, "discarding undecodable session entry");
            DbError::NotFound
        })
    }

    async fn delete(&self, id: &SessionId) -> DbResult<()> {
        let key = self.build_key(id);
        with_timeout(self.timeout, "session delete", self.del(key)).await
    }
}

impl std::fmt::Debug for RedisSessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionCache")
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}
