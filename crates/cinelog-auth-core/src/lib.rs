//! Cinelog Auth Core - Authentication business logic
//!
//! Provisions local users from third-party identities and resolves callers
//! through a two-tier credential scheme: a short-lived session held in a
//! cache, backed by a durable refresh token that can re-establish it.

pub mod bridge;
pub mod codec;
pub mod config;
pub mod directory;
pub mod error;
pub mod refresh;
pub mod retry;
pub mod service;
pub mod session;
pub mod telemetry;
pub mod token;
pub mod username;

pub use bridge::canonicalize;
pub use codec::{CookieCodec, RequestCookies, REFRESH_COOKIE, SESSION_COOKIE};
pub use config::AuthConfig;
pub use directory::UserDirectory;
pub use error::AuthError;
pub use refresh::{IssuedRefresh, RefreshManager};
pub use retry::{retry, retry_with, RetryError, RetryPolicy};
pub use service::{AuthOutcome, AuthService, LoginOutcome, LogoutOutcome};
pub use session::SessionManager;
pub use token::generate_session_id;
pub use username::UsernameGenerator;
