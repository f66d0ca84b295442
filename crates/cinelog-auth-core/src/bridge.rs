//! Identity bridge
//!
//! Normalizes a provider-verified identity into the shape provisioning
//! consumes.

use cinelog_types::{Identity, VerifiedIdentity};

/// Canonicalize a verified identity.
///
/// A display name containing any whitespace is dropped rather than
/// sanitized; an empty name tells provisioning to generate one. An empty
/// avatar URL becomes `None`.
pub fn canonicalize(verified: VerifiedIdentity) -> Identity {
    let display_name = if verified.display_name.chars().any(char::is_whitespace) {
        String::new()
    } else {
        verified.display_name
    };

    let avatar_url = Some(verified.avatar_url).filter(|url| !url.is_empty());

    Identity {
        email: verified.email,
        display_name,
        avatar_url,
    }
}
