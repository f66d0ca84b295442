//! Configuration for the Auth API service.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use cinelog_auth_core::AuthConfig;
use cinelog_db::{DbResult, MemorySessionCache, RedisSessionCache, SessionCache};

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Redis URL for the session cache; sessions stay in process memory if unset
    pub redis_url: Option<String>,

    /// Serve Prometheus counters on `/metrics`
    pub metrics_enabled: bool,

    /// Auth core configuration
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let redis_url = lookup("REDIS_URL").filter(|url| !url.is_empty());

        let http_port = parse_or(&lookup, "HTTP_PORT", 8080)?;
        let metrics_enabled = parse_or(&lookup, "METRICS_ENABLED", true)?;

        let defaults = AuthConfig::default();

        let session_ttl_secs = parse_or(
            &lookup,
            "SESSION_TTL_SECS",
            defaults.session_ttl.as_secs(),
        )?;
        let refresh_ttl_hours = parse_or(
            &lookup,
            "REFRESH_TTL_HOURS",
            defaults.refresh_ttl.as_secs() / 3600,
        )?;
        let cache_timeout_ms = parse_or(
            &lookup,
            "CACHE_TIMEOUT_MS",
            defaults.cache_timeout.as_millis() as u64,
        )?;
        let db_timeout_ms = parse_or(
            &lookup,
            "DB_TIMEOUT_MS",
            defaults.db_timeout.as_millis() as u64,
        )?;
        let secure_cookies = parse_or(&lookup, "COOKIE_SECURE", defaults.secure_cookies)?;

        let auth = defaults
            .with_session_ttl(Duration::from_secs(session_ttl_secs))
            .with_refresh_ttl(Duration::from_secs(refresh_ttl_hours * 3600))
            .with_cache_timeout(Duration::from_millis(cache_timeout_ms))
            .with_db_timeout(Duration::from_millis(db_timeout_ms))
            .with_secure_cookies(secure_cookies);

        auth.validate()
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?;

        Ok(Self {
            http_port,
            database_url,
            redis_url,
            metrics_enabled,
            auth,
        })
    }

    /// Build the session cache with the configured lifetime and deadline.
    ///
    /// Falls back to process memory when no Redis URL is set.
    pub fn session_cache(&self) -> DbResult<Arc<dyn SessionCache>> {
        match &self.redis_url {
            Some(url) => Ok(Arc::new(
                RedisSessionCache::new(url.as_str())?
                    .with_ttl(self.auth.session_ttl)
                    .with_timeout(self.auth.cache_timeout),
            )),
            None => {
                tracing::warn!("REDIS_URL not set, sessions are held in process memory");
                Ok(Arc::new(
                    MemorySessionCache::new().with_ttl(self.auth.session_ttl),
                ))
            }
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/cinelog")]).unwrap();

        assert_eq!(config.http_port, 8080);
        assert!(config.redis_url.is_none());
        assert!(config.metrics_enabled);
        assert_eq!(config.auth.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.auth.refresh_ttl, Duration::from_secs(720 * 3600));
        assert_eq!(config.auth.cache_timeout, Duration::from_secs(1));
        assert_eq!(config.auth.db_timeout, Duration::from_secs(5));
        assert!(config.auth.secure_cookies);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/cinelog"),
            ("REDIS_URL", "redis://localhost:6379"),
            ("HTTP_PORT", "9000"),
            ("SESSION_TTL_SECS", "120"),
            ("REFRESH_TTL_HOURS", "48"),
            ("CACHE_TIMEOUT_MS", "250"),
            ("DB_TIMEOUT_MS", "2000"),
            ("COOKIE_SECURE", "false"),
            ("METRICS_ENABLED", "false"),
        ])
        .unwrap();

        assert_eq!(config.http_port, 9000);
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.auth.session_ttl, Duration::from_secs(120));
        assert_eq!(config.auth.refresh_ttl, Duration::from_secs(48 * 3600));
        assert_eq!(config.auth.cache_timeout, Duration::from_millis(250));
        assert_eq!(config.auth.db_timeout, Duration::from_secs(2));
        assert!(!config.auth.secure_cookies);
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("DATABASE_URL", "postgres://x"), ("HTTP_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("HTTP_PORT")));

        let err = load(&[("DATABASE_URL", "postgres://x"), ("SESSION_TTL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::AuthConfig(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_cache_uses_configured_ttl() {
        use cinelog_db::DbError;
        use cinelog_types::{Session, SessionId, User, UserId, Username};

        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/cinelog"),
            ("SESSION_TTL_SECS", "120"),
        ])
        .unwrap();
        let cache = config.session_cache().unwrap();

        let now = chrono::Utc::now();
        let session = Session::new(
            SessionId::new("abc"),
            User {
                id: UserId(1),
                email: "a@x.com".to_string(),
                username: Username::parse("film_buff").unwrap(),
                avatar_url: None,
                created_at: now,
                updated_at: now,
            },
        );
        cache.create(&session).await.unwrap();

        tokio::time::advance(Duration::from_secs(100)).await;
        assert!(cache.read_and_refresh(&session.id).await.is_ok());

        // Idle past the configured lifetime, well short of the default hour
        tokio::time::advance(Duration::from_secs(121)).await;
        let result = cache.read_and_refresh(&session.id).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }
}
