//! Cinelog DB - Storage abstractions
//!
//! Repository traits for users, refresh tokens and sessions, with
//! PostgreSQL (sqlx), Redis (deadpool-redis) and in-memory backends.
//!
//! # Example
//!
//! ```rust,ignore
//! use cinelog_db::{create_pool, schema, Repositories, RedisSessionCache};
//!
//! let pool = create_pool("postgres://localhost/cinelog").await?;
//! schema::ensure_schema(&pool).await?;
//! let repos = Repositories::new(pool);
//! let sessions = RedisSessionCache::new("redis://localhost:6379")?;
//!
//! let user = repos.users.find_by_email("user@example.com").await?;
//! ```

pub mod cache;
pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;
pub mod schema;
pub mod timeout;

pub use cache::RedisSessionCache;
pub use error::{DbError, DbResult, UniqueConstraint};
pub use memory::{MemoryRefreshRepository, MemorySessionCache, MemoryUserRepository};
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, DbPool, PoolOptions};
pub use repo::*;
pub use timeout::with_timeout;
