//! Axum extractors over the per-request [`RequestContext`].
//!
//! # Usage
//!
//! ```ignore
//! use cinelog_axum::{CurrentUser, MaybeUser};
//!
//! // Requires authentication (401 if anonymous)
//! async fn profile(CurrentUser(user): CurrentUser) -> String {
//!     user.username.to_string()
//! }
//!
//! // Optional authentication
//! async fn greeting(MaybeUser(user): MaybeUser) -> String {
//!     match user {
//!         Some(user) => format!("Hello, {}!", user.username),
//!         None => "Hello, guest!".to_string(),
//!     }
//! }
//! ```

use std::convert::Infallible;
use std::ops::Deref;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cinelog_types::User;

use crate::context::{OptionalUser, RequestContext};
use crate::error::AuthRejection;

fn context(parts: &Parts) -> Option<&RequestContext> {
    parts.extensions.get::<RequestContext>()
}

/// Extractor acting as the authorization gate.
///
/// Returns 401 Unauthorized if no user is attached to the request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context(parts)
            .and_then(|ctx| ctx.user.clone())
            .map(Self)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Extractor for optional authentication.
///
/// Yields `None` for anonymous requests rather than failing.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub OptionalUser);

impl Deref for MaybeUser {
    type Target = OptionalUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(context(parts).and_then(|ctx| ctx.user.clone())))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(context(parts).cloned().unwrap_or_default())
    }
}
