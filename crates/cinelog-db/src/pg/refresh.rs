//! PostgreSQL refresh token repository implementation

use std::time::Duration;

use async_trait::async_trait;
use cinelog_types::{RefreshId, RefreshToken};
use sqlx::PgPool;

use super::DEFAULT_STATEMENT_TIMEOUT;
use crate::error::{DbError, DbResult};
use crate::models::RefreshUserRow;
use crate::repo::{CreateRefresh, RefreshRepository};
use crate::timeout::with_timeout;

/// PostgreSQL refresh token repository
#[derive(Clone)]
pub struct PgRefreshRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgRefreshRepository {
    /// Create a new refresh token repository
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }

    /// Set the per-statement deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl RefreshRepository for PgRefreshRepository {
    async fn create(&self, token: CreateRefresh) -> DbResult<()> {
        with_timeout(
            self.timeout,
            "refresh insert",
            sqlx::query("INSERT INTO refresh (id, user_id, expires_at) VALUES ($1, $2, $3)")
                .bind(token.id.0)
                .bind(token.user_id.0)
                .bind(token.expires_at)
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn read(&self, id: RefreshId) -> DbResult<RefreshToken> {
        // Join so callers see the user as it is now, not as it was at issuance
        let row = with_timeout(
            self.timeout,
            "refresh lookup",
            sqlx::query_as::<_, RefreshUserRow>(
                r#"
                SELECT r.id AS refresh_id, r.expires_at,
                       u.id, u.email, u.username, u.avatar_url, u.created_at, u.updated_at
                FROM refresh r
                JOIN users u ON u.id = r.user_id
                WHERE r.id = $1
                  AND (r.expires_at IS NULL OR r.expires_at > NOW())
                "#,
            )
            .bind(id.0)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.ok_or(DbError::NotFound)?.try_into()
    }

    async fn delete(&self, id: RefreshId) -> DbResult<()> {
        with_timeout(
            self.timeout,
            "refresh delete",
            sqlx::query("DELETE FROM refresh WHERE id = $1")
                .bind(id.0)
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }
}
