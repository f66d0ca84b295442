//! Cinelog Auth API
//!
//! HTTP surface over the cinelog auth core: the OAuth callback that logs a
//! user in, the current-user endpoint, logout, and health probes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use cinelog_axum::AuthLayer;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use config::{Config, ConfigError};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Build the HTTP router, serving `/metrics` when a handle is given
pub fn app(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let user_routes = Router::new()
        .route("/users/auth/callback", post(handlers::callback))
        .route("/users/me", get(handlers::me))
        .route("/users/logout", post(handlers::logout));

    let health_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready));

    let metrics_route = match metrics_handle {
        Some(handle) => {
            Router::new().route("/metrics", get(move || async move { handle.render() }))
        }
        None => Router::new(),
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(AuthLayer::new(state.auth.clone()));

    Router::new()
        .nest("/api", user_routes)
        .layer(middleware)
        .merge(health_routes) // Probes skip cookie authentication
        .merge(metrics_route)
        .with_state(state)
}
