//! Credential identifier generation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use cinelog_types::{RefreshId, SessionId};
use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes behind a session identifier
pub const SESSION_ID_BYTES: usize = 32;

/// Mint a session identifier: 256 bits from the OS CSPRNG, URL-safe base64
pub fn generate_session_id() -> SessionId {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    SessionId::new(URL_SAFE_NO_PAD.encode(bytes))
}

/// Mint a refresh identifier (UUID v4)
pub fn generate_refresh_id() -> RefreshId {
    RefreshId::new()
}
