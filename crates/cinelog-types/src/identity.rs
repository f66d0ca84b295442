//! Third-party identity types

use serde::{Deserialize, Serialize};

/// Identity as reported by an OAuth provider after a successful handshake.
///
/// The email is verified by the provider; the display name and avatar are
/// whatever the provider chose to return and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl VerifiedIdentity {
    pub fn new(
        email: impl Into<String>,
        display_name: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
            avatar_url: avatar_url.into(),
        }
    }
}

/// Canonical identity consumed by user provisioning.
///
/// An empty `display_name` means "generate a username".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Identity {
    /// Whether a username has to be generated for this identity
    pub fn needs_generated_username(&self) -> bool {
        self.display_name.is_empty()
    }
}
