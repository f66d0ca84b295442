//! Session management
//!
//! Sessions live only in the cache. Every call is bounded by the cache
//! deadline so a slow cache degrades into an infrastructure error instead
//! of a hung request.

use std::sync::Arc;
use std::time::Duration;

use cinelog_db::{with_timeout, DbResult, SessionCache};
use cinelog_types::{Session, SessionId, User};

use crate::token::generate_session_id;

/// Session manager issues, resolves and revokes cache-backed sessions
pub struct SessionManager<C: SessionCache + ?Sized> {
    cache: Arc<C>,
    timeout: Duration,
}

impl<C: SessionCache + ?Sized> Clone for SessionManager<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            timeout: self.timeout,
        }
    }
}

impl<C: SessionCache + ?Sized> SessionManager<C> {
    /// Create a new session manager
    pub fn new(cache: Arc<C>, timeout: Duration) -> Self {
        Self { cache, timeout }
    }

    /// Mint a fresh identifier and store a session for `user` under it
    pub async fn issue(&self, user: User) -> DbResult<Session> {
        let session = Session::new(generate_session_id(), user);
        with_timeout(self.timeout, "session create", self.cache.create(&session)).await?;

        tracing::debug!(user_id = %session.user.id, "Issued session");
        Ok(session)
    }

    /// Look up a session and extend its lifetime
    pub async fn resolve(&self, id: &SessionId) -> DbResult<Session> {
        with_timeout(self.timeout, "session read", self.cache.read_and_refresh(id)).await
    }

    /// Delete a session
    pub async fn revoke(&self, id: &SessionId) -> DbResult<()> {
        with_timeout(self.timeout, "session delete", self.cache.delete(id)).await
    }
}
