//! Database errors

use thiserror::Error;

/// Name of the unique constraint guarding `users.username`
pub const USERNAME_CONSTRAINT: &str = "users_username_key";
/// Name of the unique constraint guarding `users.email`
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Unique constraint that rejected a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueConstraint {
    /// Another user already owns the username
    Username,
    /// Another user already owns the email
    Email,
    /// Any other unique constraint
    Other(String),
}

impl UniqueConstraint {
    /// Classify a constraint by the name the database reported
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(USERNAME_CONSTRAINT) => Self::Username,
            Some(EMAIL_CONSTRAINT) => Self::Email,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other("unknown".to_string()),
        }
    }
}

impl std::fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Username => f.write_str(USERNAME_CONSTRAINT),
            Self::Email => f.write_str(EMAIL_CONSTRAINT),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Record not found (expected absence, not a fault)
    #[error("record not found")]
    NotFound,

    /// Insert rejected by a unique constraint
    #[error("unique constraint violated: {0}")]
    UniqueViolation(UniqueConstraint),

    /// Operation exceeded its deadline
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// Redis error
    #[error("cache error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Could not obtain a cache connection
    #[error("cache pool error: {0}")]
    CachePool(#[from] deadpool_redis::PoolError),

    /// Stored value could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A row violated a domain invariant
    #[error("invalid row: {0}")]
    InvalidRow(String),

    /// Backend could not be configured
    #[error("configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Whether this is an expected absence
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// The unique constraint that rejected a write, if any
    pub fn unique_violation(&self) -> Option<&UniqueConstraint> {
        match self {
            Self::UniqueViolation(constraint) => Some(constraint),
            _ => None,
        }
    }

    /// Whether a unique constraint on the given column rejected a write
    pub fn is_unique_violation_on(&self, constraint: &UniqueConstraint) -> bool {
        self.unique_violation() == Some(constraint)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let unique = match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Some(UniqueConstraint::from_name(db.constraint()))
            }
            _ => None,
        };
        if let Some(constraint) = unique {
            return Self::UniqueViolation(constraint);
        }

        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::PoolTimedOut => Self::Timeout("database pool acquire"),
            other => Self::Sqlx(other),
        }
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
