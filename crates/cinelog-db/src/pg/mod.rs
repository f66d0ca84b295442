//! PostgreSQL repository implementations

mod refresh;
mod user;

pub use refresh::PgRefreshRepository;
pub use user::{PgUserRepository, PgUserTransaction};

use std::time::Duration;

use crate::DbPool;

/// Default deadline for a single statement
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub refresh: PgRefreshRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            refresh: PgRefreshRepository::new(pool),
        }
    }

    /// Override the per-statement deadline of every repository
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            users: self.users.with_timeout(timeout),
            refresh: self.refresh.with_timeout(timeout),
        }
    }
}
