//! Authentication handlers (callback, me, logout)

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use cinelog_auth_core::RequestCookies;
use cinelog_axum::{append_set_cookie, request_cookies, CurrentUser, RequestContext};
use cinelog_types::{User, UserId, VerifiedIdentity};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Identity handed over by the OAuth provider integration
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
    /// Persist the login beyond the browser session
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub user: UserView,
    pub is_new: bool,
}

/// Public view of a user. Email is never sent to clients.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.as_str().to_string(),
            avatar_url: user.avatar_url.clone(),
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/users/auth/callback
///
/// Log in a provider-verified identity, provisioning the user on first sight
pub async fn callback(
    State(state): State<AppState>,
    Json(req): Json<CallbackRequest>,
) -> ApiResult<Response> {
    if req.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email is required".to_string()));
    }

    let verified = VerifiedIdentity::new(req.email, req.display_name, req.avatar_url);
    let login = state.auth.login(verified, req.remember).await?;

    let body = CallbackResponse {
        user: UserView::from(&login.user),
        is_new: login.is_new,
    };

    let mut response = (StatusCode::OK, Json(body)).into_response();
    for cookie in state.auth.login_cookies(&login) {
        append_set_cookie(response.headers_mut(), &cookie);
    }

    Ok(response)
}

/// GET /api/users/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserView> {
    Json(UserView::from(&user))
}

/// POST /api/users/logout
///
/// Revoke the presented credentials and clear both cookies. Store failures
/// are logged, never reported: the client is logged out either way.
pub async fn logout(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
) -> Response {
    let presented = request_cookies(&headers);
    let outcome = state.auth.logout(&presented).await;

    // Promotion on this very request issued a session the client never saw
    if let Some(promoted) = ctx.promoted_session {
        state
            .auth
            .logout(&RequestCookies::new(Some(promoted), None))
            .await;
    }

    tracing::info!(
        user_id = ?ctx.user.as_ref().map(|u| u.id),
        session_revoked = outcome.session_revoked,
        refresh_revoked = outcome.refresh_revoked,
        "User logged out"
    );

    let mut response = StatusCode::OK.into_response();
    for cookie in state.auth.logout_cookies() {
        append_set_cookie(response.headers_mut(), &cookie);
    }
    response
}
