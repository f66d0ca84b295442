//! Auth service - ties together provisioning, sessions and refresh tokens
//!
//! Per-request resolution is a small state machine:
//!
//! ```text
//! Unauthenticated --session hit--> SessionValid
//!        |
//!   session miss / cache fault
//!        v
//!   refresh hit --> RefreshPromoted (new session issued)
//!   refresh miss --> Unauthenticated
//! ```
//!
//! Resolution never fails the request: store faults are logged and the
//! caller is treated as unauthenticated.

use std::sync::Arc;

use cinelog_db::{DbError, RefreshRepository, SessionCache, UserRepository};
use cinelog_types::{Session, SessionId, User, VerifiedIdentity};
use cookie::Cookie;

use crate::bridge::canonicalize;
use crate::codec::{CookieCodec, RequestCookies};
use crate::config::AuthConfig;
use crate::directory::UserDirectory;
use crate::refresh::{IssuedRefresh, RefreshManager};
use crate::session::SessionManager;
use crate::telemetry;
use crate::AuthError;

/// Result of resolving a request's credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No valid credential; the request proceeds without identity
    Unauthenticated,
    /// The session cookie resolved to a live session
    SessionValid { user: User },
    /// The refresh token re-established identity.
    ///
    /// `session` is the newly issued session, or `None` if it could not be
    /// stored; the caller is authenticated for this request either way.
    RefreshPromoted {
        user: User,
        session: Option<SessionId>,
    },
}

impl AuthOutcome {
    /// The caller's identity, if any
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Unauthenticated => None,
            Self::SessionValid { user } | Self::RefreshPromoted { user, .. } => Some(user),
        }
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            Self::Unauthenticated => None,
            Self::SessionValid { user } | Self::RefreshPromoted { user, .. } => Some(user),
        }
    }

    /// Session issued by promotion, to be sent back as a cookie
    pub fn promoted_session(&self) -> Option<&SessionId> {
        match self {
            Self::RefreshPromoted { session, .. } => session.as_ref(),
            _ => None,
        }
    }

    /// Stable label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::SessionValid { .. } => "session_valid",
            Self::RefreshPromoted { .. } => "refresh_promoted",
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// Whether this login provisioned the user
    pub is_new: bool,
    pub session: Session,
    /// `None` if the refresh token could not be stored
    pub refresh: Option<IssuedRefresh>,
}

/// Which server-side credentials a logout removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub session_revoked: bool,
    pub refresh_revoked: bool,
}

/// Authentication service
///
/// Provides a unified interface for:
/// - Login from a provider-verified identity
/// - Per-request credential resolution with refresh promotion
/// - Logout
pub struct AuthService<U, R, C>
where
    U: UserRepository + ?Sized,
    R: RefreshRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    config: AuthConfig,
    codec: CookieCodec,
    directory: UserDirectory<U>,
    sessions: SessionManager<C>,
    refresh: RefreshManager<R>,
}

impl<U, R, C> AuthService<U, R, C>
where
    U: UserRepository + ?Sized,
    R: RefreshRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    /// Create a new auth service
    pub fn new(
        config: AuthConfig,
        users: Arc<U>,
        refresh: Arc<R>,
        sessions: Arc<C>,
    ) -> Result<Self, AuthError> {
        config.validate()?;

        let remember_for = chrono::Duration::from_std(config.refresh_ttl)
            .map_err(|_| AuthError::Configuration("refresh TTL out of range".to_string()))?;

        Ok(Self {
            codec: CookieCodec::new(config.secure_cookies),
            directory: UserDirectory::new(users, &config),
            sessions: SessionManager::new(sessions, config.cache_timeout),
            refresh: RefreshManager::new(refresh, remember_for, config.db_timeout),
            config,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn codec(&self) -> &CookieCodec {
        &self.codec
    }

    pub fn directory(&self) -> &UserDirectory<U> {
        &self.directory
    }

    // =========================================================================
    // Request Resolution
    // =========================================================================

    /// Resolve who is calling from the request's cookies
    pub async fn authenticate(&self, cookies: &RequestCookies) -> AuthOutcome {
        let outcome = self.resolve(cookies).await;
        telemetry::record_outcome(outcome.label());
        outcome
    }

    async fn resolve(&self, cookies: &RequestCookies) -> AuthOutcome {
        if let Some(session_id) = &cookies.session {
            match self.sessions.resolve(session_id).await {
                Ok(session) => return AuthOutcome::SessionValid { user: session.user },
                Err(DbError::NotFound) => tracing::debug!("Session not found"),
                Err(e) => tracing::error!("Session lookup failed, falling back to refresh: {}", e),
            }
        }

        let Some(refresh_id) = cookies.refresh else {
            return AuthOutcome::Unauthenticated;
        };

        let token = match self.refresh.resolve(refresh_id).await {
            Ok(token) => token,
            Err(DbError::NotFound) => {
                tracing::debug!("Refresh token not found");
                return AuthOutcome::Unauthenticated;
            }
            Err(e) => {
                tracing::error!("Refresh lookup failed: {}", e);
                return AuthOutcome::Unauthenticated;
            }
        };

        let session = match self.sessions.issue(token.user.clone()).await {
            Ok(session) => Some(session.id),
            Err(e) => {
                tracing::warn!(
                    user_id = %token.user.id,
                    "Promoted session not stored, continuing for this request: {}",
                    e
                );
                None
            }
        };

        AuthOutcome::RefreshPromoted {
            user: token.user,
            session,
        }
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Log in a provider-verified identity.
    ///
    /// Provisions the user if needed and always issues a session. A refresh
    /// token is issued too, with an absolute expiry only when `remember` is
    /// set; failing to store it does not fail the login.
    pub async fn login(
        &self,
        verified: VerifiedIdentity,
        remember: bool,
    ) -> Result<LoginOutcome, AuthError> {
        let identity = canonicalize(verified);
        let (user, is_new) = self.directory.read_or_create(&identity).await?;

        let session = self.sessions.issue(user.clone()).await?;

        let refresh = match self.refresh.issue(user.id, remember).await {
            Ok(issued) => Some(issued),
            Err(e) => {
                tracing::warn!(user_id = %user.id, "Refresh token not stored: {}", e);
                None
            }
        };

        telemetry::record_outcome("login");
        tracing::info!(user_id = %user.id, is_new, remember, "User logged in");

        Ok(LoginOutcome {
            user,
            is_new,
            session,
            refresh,
        })
    }

    /// Revoke the credentials a request presented.
    ///
    /// Both deletions are attempted regardless of each other's outcome.
    pub async fn logout(&self, cookies: &RequestCookies) -> LogoutOutcome {
        let revoke_session = async {
            let Some(id) = &cookies.session else {
                return false;
            };
            match self.sessions.revoke(id).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Failed to revoke session: {}", e);
                    false
                }
            }
        };

        let revoke_refresh = async {
            let Some(id) = cookies.refresh else {
                return false;
            };
            match self.refresh.revoke(id).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Failed to revoke refresh token: {}", e);
                    false
                }
            }
        };

        let (session_revoked, refresh_revoked) = tokio::join!(revoke_session, revoke_refresh);
        telemetry::record_outcome("logout");

        LogoutOutcome {
            session_revoked,
            refresh_revoked,
        }
    }

    // =========================================================================
    // Cookies
    // =========================================================================

    /// Cookies to set after a login
    pub fn login_cookies(&self, outcome: &LoginOutcome) -> Vec<Cookie<'static>> {
        let mut cookies = vec![self.codec.session_cookie(&outcome.session.id)];
        if let Some(refresh) = &outcome.refresh {
            cookies.push(self.codec.refresh_cookie(refresh.id, refresh.expires_at));
        }
        cookies
    }

    /// Cookie carrying a session issued by refresh promotion
    pub fn promotion_cookie(&self, outcome: &AuthOutcome) -> Option<Cookie<'static>> {
        outcome
            .promoted_session()
            .map(|id| self.codec.session_cookie(id))
    }

    /// Cookies clearing both credentials on the client
    pub fn logout_cookies(&self) -> [Cookie<'static>; 2] {
        [self.codec.session_removal(), self.codec.refresh_removal()]
    }
}

impl<U, R, C> std::fmt::Debug for AuthService<U, R, C>
where
    U: UserRepository + ?Sized,
    R: RefreshRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish()
    }
}
