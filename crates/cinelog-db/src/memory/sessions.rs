//! In-memory session cache with sliding expiration

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cinelog_types::{Session, SessionId};
use dashmap::DashMap;
use tokio::time::Instant;

use crate::cache::DEFAULT_SESSION_TTL;
use crate::error::{DbError, DbResult};
use crate::repo::SessionCache;

#[derive(Debug, Clone)]
struct Entry {
    session: Session,
    deadline: Instant,
}

/// Session cache held in process memory.
///
/// Deadlines use the tokio clock, so tests can drive expiry with
/// `tokio::time::advance`.
#[derive(Debug, Clone)]
pub struct MemorySessionCache {
    entries: Arc<DashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for MemorySessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Set the sliding lifetime applied on create and on every read
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.deadline > now);
        before - self.entries.len()
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn create(&self, session: &Session) -> DbResult<()> {
        self.entries.insert(
            session.id.as_str().to_string(),
            Entry {
                session: session.clone(),
                deadline: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }

    async fn read_and_refresh(&self, id: &SessionId) -> DbResult<Session> {
        let now = Instant::now();

        if let Some(mut entry) = self.entries.get_mut(id.as_str()) {
            if entry.deadline > now {
                entry.deadline = now + self.ttl;
                return Ok(entry.session.clone());
            }
        }

        self.entries
            .remove_if(id.as_str(), |_, entry| entry.deadline <= now);
        Err(DbError::NotFound)
    }

    async fn delete(&self, id: &SessionId) -> DbResult<()> {
        self.entries.remove(id.as_str());
        Ok(())
    }
}
