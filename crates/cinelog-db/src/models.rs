//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use cinelog_types::{RefreshId, RefreshToken, User, UserId, Username};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::DbError;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Refresh row joined with its owning user
#[derive(Debug, Clone, FromRow)]
pub struct RefreshUserRow {
    pub refresh_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    #[sqlx(flatten)]
    pub user: UserRow,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(row.username)
            .map_err(|e| DbError::InvalidRow(format!("user {}: {e}", row.id)))?;

        Ok(User {
            id: UserId(row.id),
            email: row.email,
            username,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<RefreshUserRow> for RefreshToken {
    type Error = DbError;

    fn try_from(row: RefreshUserRow) -> Result<Self, Self::Error> {
        Ok(RefreshToken {
            id: RefreshId(row.refresh_id),
            user: row.user.try_into()?,
            expires_at: row.expires_at,
        })
    }
}
