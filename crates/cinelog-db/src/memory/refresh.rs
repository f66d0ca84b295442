//! In-memory refresh token repository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cinelog_types::{RefreshId, RefreshToken, UserId};
use dashmap::DashMap;

use super::MemoryUserRepository;
use crate::error::{DbError, DbResult};
use crate::repo::{CreateRefresh, RefreshRepository, UserRepository};

#[derive(Debug, Clone, Copy)]
struct Record {
    user_id: UserId,
    expires_at: Option<DateTime<Utc>>,
}

/// Refresh tokens held in process memory, joined against a
/// [`MemoryUserRepository`] on read.
#[derive(Debug, Clone)]
pub struct MemoryRefreshRepository {
    users: MemoryUserRepository,
    tokens: Arc<DashMap<RefreshId, Record>>,
}

impl MemoryRefreshRepository {
    pub fn new(users: MemoryUserRepository) -> Self {
        Self {
            users,
            tokens: Arc::new(DashMap::new()),
        }
    }

    /// Whether a token row exists, expired or not
    pub fn contains(&self, id: RefreshId) -> bool {
        self.tokens.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl RefreshRepository for MemoryRefreshRepository {
    async fn create(&self, token: CreateRefresh) -> DbResult<()> {
        if self.users.find_by_id(token.user_id).await?.is_none() {
            return Err(DbError::InvalidRow(format!(
                "refresh token references unknown user {}",
                token.user_id
            )));
        }

        self.tokens.insert(
            token.id,
            Record {
                user_id: token.user_id,
                expires_at: token.expires_at,
            },
        );
        Ok(())
    }

    async fn read(&self, id: RefreshId) -> DbResult<RefreshToken> {
        let record = *self.tokens.get(&id).ok_or(DbError::NotFound)?;

        if record.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(DbError::NotFound);
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(RefreshToken {
            id,
            user,
            expires_at: record.expires_at,
        })
    }

    async fn delete(&self, id: RefreshId) -> DbResult<()> {
        self.tokens.remove(&id);
        Ok(())
    }
}
