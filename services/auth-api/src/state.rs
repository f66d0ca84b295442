//! Application state

use std::sync::Arc;
use std::time::Duration;

use cinelog_axum::DynAuthService;
use cinelog_db::DbPool;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Login, logout and request authentication
    pub auth: Arc<DynAuthService>,
    /// Database connection pool, for readiness checks
    pub pool: DbPool,
}

impl AppState {
    /// Create new application state
    pub fn new(auth: DynAuthService, pool: DbPool) -> Self {
        Self {
            auth: Arc::new(auth),
            pool,
        }
    }

    /// Deadline for a single database round trip
    pub fn db_timeout(&self) -> Duration {
        self.auth.config().db_timeout
    }
}
