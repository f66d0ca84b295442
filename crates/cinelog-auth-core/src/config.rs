//! Configuration types for the auth core

use std::time::Duration;

use crate::AuthError;

/// Auth core configuration
///
/// Built once at startup and handed to [`AuthService::new`](crate::AuthService::new).
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Sliding lifetime of a session in the cache.
    ///
    /// Expiry is enforced by the cache itself, so this only takes effect
    /// through the `with_ttl` of the cache handed to the service.
    pub session_ttl: Duration,
    /// Absolute lifetime of a refresh token issued with "remember me"
    pub refresh_ttl: Duration,
    /// Deadline for a single cache operation
    pub cache_timeout: Duration,
    /// Deadline for a single database operation
    pub db_timeout: Duration,
    /// Insert attempts per provisioning before giving up on a username
    pub username_attempts: u32,
    /// Full provisioning attempts when racing another request on an email
    pub provisioning_attempts: u32,
    /// Mark cookies `Secure`
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(60 * 60),
            refresh_ttl: Duration::from_secs(720 * 60 * 60), // 30 days
            cache_timeout: Duration::from_secs(1),
            db_timeout: Duration::from_secs(5),
            username_attempts: 10,
            provisioning_attempts: 3,
            secure_cookies: true,
        }
    }
}

impl AuthConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set session lifetime
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set remember-me refresh lifetime
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Set cache operation deadline
    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    /// Set database operation deadline
    pub fn with_db_timeout(mut self, timeout: Duration) -> Self {
        self.db_timeout = timeout;
        self
    }

    /// Set username attempt budget
    pub fn with_username_attempts(mut self, attempts: u32) -> Self {
        self.username_attempts = attempts;
        self
    }

    /// Set provisioning attempt budget
    pub fn with_provisioning_attempts(mut self, attempts: u32) -> Self {
        self.provisioning_attempts = attempts;
        self
    }

    /// Enable or disable the `Secure` cookie attribute
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Reject values the core cannot operate with
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.session_ttl < Duration::from_secs(1) {
            return Err(AuthError::Configuration(
                "session TTL must be at least one second".to_string(),
            ));
        }
        if self.refresh_ttl.is_zero() {
            return Err(AuthError::Configuration(
                "refresh TTL must be positive".to_string(),
            ));
        }
        if self.cache_timeout.is_zero() || self.db_timeout.is_zero() {
            return Err(AuthError::Configuration(
                "store timeouts must be positive".to_string(),
            ));
        }
        if self.username_attempts == 0 || self.provisioning_attempts == 0 {
            return Err(AuthError::Configuration(
                "attempt budgets must be at least one".to_string(),
            ));
        }
        Ok(())
    }
}
