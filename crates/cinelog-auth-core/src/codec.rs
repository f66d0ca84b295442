//! Token/cookie codec
//!
//! Turns session and refresh identifiers into outbound cookies and reads
//! them back from a request's `Cookie` headers. Both cookies are
//! `HttpOnly`, `Path=/` and `SameSite=Strict`; `Secure` is on unless
//! disabled for local development.

use chrono::{DateTime, Utc};
use cinelog_types::{RefreshId, SessionId};
use cookie::time::OffsetDateTime;
use cookie::{Cookie, SameSite};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";
/// Name of the refresh cookie
pub const REFRESH_COOKIE: &str = "refresh";

/// Builds the cookies this core sets
#[derive(Debug, Clone, Copy)]
pub struct CookieCodec {
    secure: bool,
}

impl Default for CookieCodec {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CookieCodec {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    fn base(&self, name: &'static str, value: String) -> cookie::CookieBuilder<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .path("/")
            .same_site(SameSite::Strict)
    }

    /// Session cookie. No expiry: the cache TTL governs validity.
    pub fn session_cookie(&self, id: &SessionId) -> Cookie<'static> {
        self.base(SESSION_COOKIE, id.as_str().to_string()).build()
    }

    /// Refresh cookie, persistent only when `expires_at` is set
    pub fn refresh_cookie(
        &self,
        id: RefreshId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Cookie<'static> {
        let mut builder = self.base(REFRESH_COOKIE, id.to_string());
        if let Some(expires) = expires_at.and_then(to_offset_date_time) {
            builder = builder.expires(expires);
        }
        builder.build()
    }

    /// Cookie instructing the client to drop the session cookie
    pub fn session_removal(&self) -> Cookie<'static> {
        self.removal(SESSION_COOKIE)
    }

    /// Cookie instructing the client to drop the refresh cookie
    pub fn refresh_removal(&self) -> Cookie<'static> {
        self.removal(REFRESH_COOKIE)
    }

    fn removal(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.base(name, String::new()).build();
        cookie.make_removal();
        cookie
    }
}

fn to_offset_date_time(at: DateTime<Utc>) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(at.timestamp()).ok()
}

/// Credentials presented by a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    pub session: Option<SessionId>,
    pub refresh: Option<RefreshId>,
}

impl RequestCookies {
    pub fn new(session: Option<SessionId>, refresh: Option<RefreshId>) -> Self {
        Self { session, refresh }
    }

    /// Parse the values of every `Cookie` header on a request.
    ///
    /// The first cookie of each name wins. Empty values, malformed pairs and
    /// refresh values that are not UUIDs are treated as absent.
    pub fn from_header_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut cookies = Self::default();

        for header in values {
            for parsed in Cookie::split_parse(header) {
                let Ok(cookie) = parsed else { continue };
                if cookie.value().is_empty() {
                    continue;
                }

                match cookie.name() {
                    SESSION_COOKIE if cookies.session.is_none() => {
                        cookies.session = Some(SessionId::new(cookie.value()));
                    }
                    REFRESH_COOKIE if cookies.refresh.is_none() => {
                        match RefreshId::parse(cookie.value()) {
                            Ok(id) => cookies.refresh = Some(id),
                            Err(e) => tracing::debug!("Ignoring malformed refresh cookie: {}", e),
                        }
                    }
                    _ => {}
                }
            }
        }

        cookies
    }

    /// Whether the request carried any credential at all
    pub fn is_empty(&self) -> bool {
        self.session.is_none() && self.refresh.is_none()
    }
}
