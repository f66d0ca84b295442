//! Tower middleware layer running cookie authentication.
//!
//! The [`AuthLayer`] resolves every request's `session`/`refresh` cookies
//! through [`AuthService::authenticate`], attaches the resulting
//! [`RequestContext`] and, when a refresh token was promoted, appends the new
//! session cookie to the response. It never rejects a request; use the
//! [`CurrentUser`](crate::CurrentUser) extractor to gate handlers.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, Response};
use cinelog_auth_core::{AuthOutcome, AuthService, RequestCookies, SESSION_COOKIE};
use cinelog_db::{RefreshRepository, SessionCache, UserRepository};
use cookie::Cookie;
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::context::RequestContext;

/// Auth service over trait-object storage backends
pub type DynAuthService = AuthService<dyn UserRepository, dyn RefreshRepository, dyn SessionCache>;

/// Parse the credentials carried by a request's `Cookie` headers
pub fn request_cookies(headers: &HeaderMap) -> RequestCookies {
    RequestCookies::from_header_values(
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok()),
    )
}

/// Append a `Set-Cookie` header for `cookie`
pub fn append_set_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(cookie = cookie.name(), "Cookie not encodable as header: {}", e),
    }
}

fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split_once('='))
        .any(|(cookie_name, _)| cookie_name.trim() == name)
}

/// Tower layer that authenticates requests from their cookies.
pub struct AuthLayer<U = dyn UserRepository, R = dyn RefreshRepository, C = dyn SessionCache>
where
    U: UserRepository + ?Sized,
    R: RefreshRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    auth: Arc<AuthService<U, R, C>>,
}

impl<U, R, C> AuthLayer<U, R, C>
where
    U: UserRepository + ?Sized,
    R: RefreshRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    /// Create a new auth layer over a shared service
    #[must_use]
    pub fn new(auth: Arc<AuthService<U, R, C>>) -> Self {
        Self { auth }
    }
}

impl<U, R, C> Clone for AuthLayer<U, R, C>
where
    U: UserRepository + ?Sized,
    R: RefreshRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
        }
    }
}

impl<S, U, R, C> Layer<S> for AuthLayer<U, R, C>
where
    U: UserRepository + ?Sized,
    R: RefreshRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    type Service = AuthMiddleware<S, U, R, C>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            auth: Arc::clone(&self.auth),
        }
    }
}

/// The authentication middleware service.
pub struct AuthMiddleware<S, U = dyn UserRepository, R = dyn RefreshRepository, C = dyn SessionCache>
where
    U: UserRepository + ?Sized,
    R: RefreshRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    inner: S,
    auth: Arc<AuthService<U, R, C>>,
}

impl<S, U, R, C> Clone for AuthMiddleware<S, U, R, C>
where
    S: Clone,
    U: UserRepository + ?Sized,
    R: RefreshRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            auth: Arc::clone(&self.auth),
        }
    }
}

impl<S, U, R, C> Service<Request<Body>> for AuthMiddleware<S, U, R, C>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    U: UserRepository + ?Sized + 'static,
    R: RefreshRepository + ?Sized + 'static,
    C: SessionCache + ?Sized + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let auth = Arc::clone(&self.auth);
        // The clone is not driven to readiness; keep the ready one for this call
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let cookies = request_cookies(req.headers());
            let outcome = if cookies.is_empty() {
                AuthOutcome::Unauthenticated
            } else {
                auth.authenticate(&cookies).await
            };

            let promotion = auth.promotion_cookie(&outcome);
            req.extensions_mut().insert(RequestContext::from(outcome));

            let mut response = inner.call(req).await?;

            if let Some(cookie) = promotion {
                // A handler that set the session cookie itself (login, logout) wins
                if !sets_cookie(response.headers(), SESSION_COOKIE) {
                    append_set_cookie(response.headers_mut(), &cookie);
                }
            }

            Ok(response)
        })
    }
}
