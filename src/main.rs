use std::sync::Arc;
use std::time::Duration;

use axum::http::{header::CONTENT_TYPE, Method};
use axum::Router;
use postboard::{
    api_routes, apply_schema, common_routes, common_routes_with_ready, ensure_database_exists,
    sync_routes, AppState, BackendConfig, Config, SyncState, SyncStore,
};
use tokio::net::TcpListener;
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing_subscriber::EnvFilter;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("postboard=info")),
        )
        .init();

    let config = Config::from_env()?;
    let app = match &config.backend {
        BackendConfig::Postgres {
            database_url,
            max_connections,
        } => {
            ensure_database_exists(database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(database_url)
                .await?;
            apply_schema(&pool).await?;
            let state = AppState { pool };
            Router::new()
                .merge(common_routes_with_ready(state.clone()))
                .nest("/api", api_routes(state))
        }
        BackendConfig::Sync { app_id, data_dir } => {
            tracing::info!(app_id = %app_id, "using sync backend");
            let store = SyncStore::open(data_dir, app_id)?;
            let state = SyncState {
                store: Arc::new(store),
            };
            Router::new()
                .merge(common_routes())
                .nest("/api", sync_routes(state))
        }
    };

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = app
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("listening on {address}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("failed to install Ctrl+C handler");
        tracing::info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        tracing::info!("received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
