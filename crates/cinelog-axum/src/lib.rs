//! Cinelog Axum Integration
//!
//! Runs cookie authentication for every request and exposes the result to
//! handlers.
//!
//! # Quick Start
//!
//! ```ignore
//! use cinelog_axum::{AuthLayer, CurrentUser};
//! use axum::{Router, routing::get};
//!
//! async fn profile(CurrentUser(user): CurrentUser) -> String {
//!     format!("Hello, {}!", user.username)
//! }
//!
//! let app = Router::new()
//!     .route("/api/users/me", get(profile))
//!     .layer(AuthLayer::new(auth_service));
//! ```
//!
//! # Extractors
//!
//! - [`CurrentUser`] - Requires an authenticated caller (401 otherwise)
//! - [`MaybeUser`] - The caller's user, if any
//! - [`RequestContext`] - Full per-request authentication result

pub mod context;
pub mod error;
pub mod extractors;
pub mod layer;

pub use context::{AuthSource, OptionalUser, RequestContext};
pub use error::AuthRejection;
pub use extractors::{CurrentUser, MaybeUser};
pub use layer::{append_set_cookie, request_cookies, AuthLayer, AuthMiddleware, DynAuthService};
