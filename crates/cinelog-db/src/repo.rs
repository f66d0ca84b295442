//! Repository traits
//!
//! Define async repository interfaces for the stores used by the auth core.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cinelog_types::{RefreshId, RefreshToken, Session, SessionId, User, UserId, Username};

use crate::error::DbResult;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: UserId) -> DbResult<Option<User>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>>;

    /// Open a transaction for provisioning
    async fn begin(&self) -> DbResult<Box<dyn UserTransaction>>;
}

/// A provisioning transaction over the user table.
///
/// Dropping the transaction without committing rolls it back.
#[async_trait]
pub trait UserTransaction: Send {
    /// Find a user by email inside the transaction
    async fn find_by_email(&mut self, email: &str) -> DbResult<Option<User>>;

    /// Insert a new user.
    ///
    /// A rejected insert leaves the transaction usable, so the caller can
    /// retry with a different username.
    async fn insert(&mut self, user: &CreateUser) -> DbResult<User>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> DbResult<()>;

    /// Roll the transaction back
    async fn rollback(self: Box<Self>) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub username: Username,
    pub avatar_url: Option<String>,
}

/// Refresh token repository trait
#[async_trait]
pub trait RefreshRepository: Send + Sync {
    /// Persist a new refresh token
    async fn create(&self, token: CreateRefresh) -> DbResult<()>;

    /// Read a refresh token joined with a live user snapshot.
    ///
    /// Fails with [`DbError::NotFound`](crate::DbError::NotFound) when the
    /// token does not exist or its absolute expiry has passed.
    async fn read(&self, id: RefreshId) -> DbResult<RefreshToken>;

    /// Delete a refresh token; deleting a missing token is not an error
    async fn delete(&self, id: RefreshId) -> DbResult<()>;
}

/// Create refresh token input
#[derive(Debug, Clone)]
pub struct CreateRefresh {
    pub id: RefreshId,
    pub user_id: UserId,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Session cache trait
///
/// Entries carry a sliding time-to-live owned by the implementation.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Store a session, replacing any entry with the same identifier
    async fn create(&self, session: &Session) -> DbResult<()>;

    /// Read a session and reset its time-to-live in one step.
    ///
    /// Fails with [`DbError::NotFound`](crate::DbError::NotFound) when the
    /// entry is absent or expired.
    async fn read_and_refresh(&self, id: &SessionId) -> DbResult<Session>;

    /// Delete a session; deleting a missing session is not an error
    async fn delete(&self, id: &SessionId) -> DbResult<()>;
}
