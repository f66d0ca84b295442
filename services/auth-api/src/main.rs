//! Cinelog Auth API
//!
//! Login, logout and session resolution over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use auth_api::{app, observability, AppState, Config};
use cinelog_auth_core::AuthService;
use cinelog_axum::DynAuthService;
use cinelog_db::{create_pool, schema, RefreshRepository, Repositories, UserRepository};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("auth_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cinelog Auth API");

    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        redis = config.redis_url.is_some(),
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(observability::install_recorder()?)
    } else {
        None
    };

    // Database
    let pool = create_pool(&config.database_url).await?;
    schema::ensure_schema(&pool).await?;
    tracing::info!("Database pool created");

    let repos = Repositories::new(pool.clone()).with_timeout(config.auth.db_timeout);

    let sessions = config.session_cache()?;

    let users: Arc<dyn UserRepository> = Arc::new(repos.users);
    let refresh: Arc<dyn RefreshRepository> = Arc::new(repos.refresh);
    let auth: DynAuthService = AuthService::new(config.auth.clone(), users, refresh, sessions)?;

    let state = AppState::new(auth, pool);
    let router = app(state, metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
