//! Per-request authentication context.
//!
//! The [`RequestContext`] is inserted into request extensions by the auth
//! layer and read back by the extractors.

use cinelog_auth_core::AuthOutcome;
use cinelog_types::{SessionId, User};

/// The caller's user, or `None` for an anonymous request
pub type OptionalUser = Option<User>;

/// How the caller's identity was established for this request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthSource {
    /// No valid credential was presented.
    #[default]
    Anonymous,
    /// A live session cookie.
    Session,
    /// A refresh token, promoted to a new session.
    Refresh,
}

/// Authentication result attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// The authenticated user, if any.
    pub user: OptionalUser,
    /// Where the identity came from.
    pub source: AuthSource,
    /// Session issued by refresh promotion during this request.
    pub promoted_session: Option<SessionId>,
}

impl RequestContext {
    /// Context for a request without identity
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl From<AuthOutcome> for RequestContext {
    fn from(outcome: AuthOutcome) -> Self {
        match outcome {
            AuthOutcome::Unauthenticated => Self::anonymous(),
            AuthOutcome::SessionValid { user } => Self {
                user: Some(user),
                source: AuthSource::Session,
                promoted_session: None,
            },
            AuthOutcome::RefreshPromoted { user, session } => Self {
                user: Some(user),
                source: AuthSource::Refresh,
                promoted_session: session,
            },
        }
    }
}
