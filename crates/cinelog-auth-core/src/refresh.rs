//! Refresh token management

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cinelog_db::{with_timeout, CreateRefresh, DbResult, RefreshRepository};
use cinelog_types::{RefreshId, RefreshToken, UserId};

use crate::token::generate_refresh_id;

/// A refresh token that was just persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedRefresh {
    pub id: RefreshId,
    /// Set only for "remember me" logins
    pub expires_at: Option<DateTime<Utc>>,
}

/// Refresh manager issues, resolves and revokes durable refresh tokens
pub struct RefreshManager<R: RefreshRepository + ?Sized> {
    repo: Arc<R>,
    remember_for: chrono::Duration,
    timeout: Duration,
}

impl<R: RefreshRepository + ?Sized> Clone for RefreshManager<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            remember_for: self.remember_for,
            timeout: self.timeout,
        }
    }
}

impl<R: RefreshRepository + ?Sized> RefreshManager<R> {
    /// Create a new refresh manager
    ///
    /// `remember_for` is the absolute lifetime given to tokens issued with
    /// "remember me"; other tokens carry no server-side expiry.
    pub fn new(repo: Arc<R>, remember_for: chrono::Duration, timeout: Duration) -> Self {
        Self {
            repo,
            remember_for,
            timeout,
        }
    }

    /// Persist a new refresh token for `user_id`
    pub async fn issue(&self, user_id: UserId, remember: bool) -> DbResult<IssuedRefresh> {
        let issued = IssuedRefresh {
            id: generate_refresh_id(),
            expires_at: remember.then(|| Utc::now() + self.remember_for),
        };

        with_timeout(
            self.timeout,
            "refresh create",
            self.repo.create(CreateRefresh {
                id: issued.id,
                user_id,
                expires_at: issued.expires_at,
            }),
        )
        .await?;

        tracing::debug!(%user_id, remember, "Issued refresh token");
        Ok(issued)
    }

    /// Look up a live refresh token and its user
    pub async fn resolve(&self, id: RefreshId) -> DbResult<RefreshToken> {
        with_timeout(self.timeout, "refresh read", self.repo.read(id)).await
    }

    /// Delete a refresh token
    pub async fn revoke(&self, id: RefreshId) -> DbResult<()> {
        with_timeout(self.timeout, "refresh delete", self.repo.delete(id)).await
    }
}
