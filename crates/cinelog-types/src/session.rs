//! Session and refresh token types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::User;

/// Opaque session identifier.
///
/// Session identifiers are random strings minted by the auth core; they are
/// only ever compared for equality and used as cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an identifier received from a client or minted by the core
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache-backed binding of a session identifier to a user snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user: User,
}

impl Session {
    pub fn new(id: SessionId, user: User) -> Self {
        Self { id, user }
    }
}

/// Opaque refresh token identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshId(pub Uuid);

impl RefreshId {
    /// Create a new random refresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a refresh identifier from a cookie value
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for RefreshId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RefreshId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RefreshId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Durable binding of a refresh identifier to a user.
///
/// `expires_at` is only set for persistent ("remember me") logins; without
/// it the token lives as long as the browser keeps the cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: RefreshId,
    pub user: User,
    pub expires_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Check whether the absolute expiry (if any) has passed
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{UserId, Username};
    use chrono::Duration;

    fn user() -> User {
        User {
            id: UserId(7),
            email: "a@x.com".to_string(),
            username: Username::parse("BraveOtter12").unwrap(),
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_refresh_without_expiry_never_expires() {
        let token = RefreshToken {
            id: RefreshId::new(),
            user: user(),
            expires_at: None,
        };
        assert!(!token.is_expired_at(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn test_refresh_with_expiry() {
        let now = Utc::now();
        let token = RefreshToken {
            id: RefreshId::new(),
            user: user(),
            expires_at: Some(now + Duration::hours(1)),
        };
        assert!(!token.is_expired_at(now));
        assert!(token.is_expired_at(now + Duration::hours(2)));
    }

    #[test]
    fn test_session_snapshot_roundtrip() {
        let session = Session::new(SessionId::new("abc"), user());
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_refresh_id_parse_rejects_garbage() {
        assert!(RefreshId::parse("not-a-uuid").is_err());
        let id = RefreshId::new();
        assert_eq!(RefreshId::parse(&id.to_string()).unwrap(), id);
    }
}
