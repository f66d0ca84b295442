//! Cinelog Types - Shared domain types
//!
//! This crate contains domain types used across cinelog crates:
//! - Users and usernames
//! - Canonical third-party identities
//! - Sessions and refresh tokens

pub mod identity;
pub mod session;
pub mod user;

pub use identity::*;
pub use session::*;
pub use user::*;
