//! Idempotent schema bootstrap for the tables owned by the auth core

use crate::error::DbResult;
use crate::DbPool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          BIGSERIAL PRIMARY KEY,
        username    TEXT NOT NULL,
        email       TEXT NOT NULL,
        avatar_url  TEXT,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT users_username_key UNIQUE (username),
        CONSTRAINT users_email_key UNIQUE (email),
        CHECK (char_length(username) BETWEEN 5 AND 30),
        CHECK (char_length(email) BETWEEN 3 AND 254)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS refresh (
        id          UUID PRIMARY KEY,
        user_id     BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        expires_at  TIMESTAMPTZ,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_refresh_user_id ON refresh (user_id)",
];

/// Create the `users` and `refresh` tables if they do not exist.
///
/// The unique constraints are named explicitly because provisioning tells
/// username collisions from email collisions by constraint name.
pub async fn ensure_schema(pool: &DbPool) -> DbResult<()> {
    for statement in STATEMENTS {
        sqlx::query(*statement).execute(pool).await?;
    }
    tracing::debug!(statements = STATEMENTS.len(), "schema ensured");
    Ok(())
}
