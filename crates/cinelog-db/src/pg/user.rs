//! PostgreSQL user repository implementation

use std::time::Duration;

use async_trait::async_trait;
use cinelog_types::{User, UserId};
use sqlx::{Connection, PgPool, Postgres, Transaction};

use super::DEFAULT_STATEMENT_TIMEOUT;
use crate::error::DbResult;
use crate::models::UserRow;
use crate::repo::{CreateUser, UserRepository, UserTransaction};
use crate::timeout::with_timeout;

const SELECT_BY_ID: &str = r#"
    SELECT id, email, username, avatar_url, created_at, updated_at
    FROM users
    WHERE id = $1
"#;

const SELECT_BY_EMAIL: &str = r#"
    SELECT id, email, username, avatar_url, created_at, updated_at
    FROM users
    WHERE email = $1
"#;

const INSERT_USER: &str = r#"
    INSERT INTO users (email, username, avatar_url)
    VALUES ($1, $2, $3)
    RETURNING id, email, username, avatar_url, created_at, updated_at
"#;

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserRepository {
    /// Create a new user repository
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
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> DbResult<Option<User>> {
        let row = with_timeout(
            self.timeout,
            "user lookup by id",
            sqlx::query_as::<_, UserRow>(SELECT_BY_ID)
                .bind(id.0)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let row = with_timeout(
            self.timeout,
            "user lookup by email",
            sqlx::query_as::<_, UserRow>(SELECT_BY_EMAIL)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn begin(&self) -> DbResult<Box<dyn UserTransaction>> {
        let tx = with_timeout(self.timeout, "transaction begin", self.pool.begin()).await?;
        Ok(Box::new(PgUserTransaction {
            tx,
            timeout: self.timeout,
        }))
    }
}

/// Provisioning transaction on a pooled PostgreSQL connection
pub struct PgUserTransaction {
    tx: Transaction<'static, Postgres>,
    timeout: Duration,
}

impl PgUserTransaction {
    /// Insert inside a savepoint so a constraint violation only rolls back
    /// this attempt instead of aborting the whole transaction.
    async fn insert_in_savepoint(&mut self, user: &CreateUser) -> DbResult<UserRow> {
        let mut savepoint = Connection::begin(&mut *self.tx).await?;

        let result = sqlx::query_as::<_, UserRow>(INSERT_USER)
            .bind(&user.email)
            .bind(user.username.as_str())
            .bind(&user.avatar_url)
            .fetch_one(&mut *savepoint)
            .await;

        match result {
            Ok(row) => {
                savepoint.commit().await?;
                Ok(row)
            }
            Err(err) => {
                savepoint.rollback().await?;
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl UserTransaction for PgUserTransaction {
    async fn find_by_email(&mut self, email: &str) -> DbResult<Option<User>> {
        let row = with_timeout(
            self.timeout,
            "user lookup by email",
            sqlx::query_as::<_, UserRow>(SELECT_BY_EMAIL)
                .bind(email)
                .fetch_optional(&mut *self.tx),
        )
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn insert(&mut self, user: &CreateUser) -> DbResult<User> {
        let timeout = self.timeout;
        let row = with_timeout(timeout, "user insert", self.insert_in_savepoint(user)).await?;
        row.try_into()
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        let this = *self;
        with_timeout(this.timeout, "transaction commit", this.tx.commit()).await
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        let this = *self;
        with_timeout(this.timeout, "transaction rollback", this.tx.rollback()).await
    }
}
