//! Eat Race Back binary entrypoint wiring REST, SSE room feeds and the storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eat_race_back::{
    config::AppConfig,
    dao::competition_store::memory::MemoryCompetitionStore,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = build_state(config);

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the storage backend from `STORAGE_BACKEND` (`mongo` by default, or `memory`).
fn build_state(config: AppConfig) -> SharedState {
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "mongo".into());
    match backend.to_ascii_lowercase().as_str() {
        "memory" => {
            info!("using in-memory storage; data is lost on restart");
            AppState::with_store(config, Arc::new(MemoryCompetitionStore::new()))
        }
        other => {
            if other != "mongo" {
                warn!(backend = other, "unknown STORAGE_BACKEND; falling back to mongo");
            }
            mongo_state(config)
        }
    }
}

#[cfg(feature = "mongo-store")]
fn mongo_state(config: AppConfig) -> SharedState {
    use eat_race_back::{
        dao::{
            competition_store::{
                CompetitionStore,
                mongodb::{MongoCompetitionStore, MongoConfig},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    let state = AppState::new(config);
    tokio::spawn(storage_supervisor::run(state.clone(), || async {
        let config = MongoConfig::from_env().await?;
        let store = MongoCompetitionStore::connect(config).await?;
        Ok::<Arc<dyn CompetitionStore>, StorageError>(Arc::new(store))
    }));
    state
}

#[cfg(not(feature = "mongo-store"))]
fn mongo_state(config: AppConfig) -> SharedState {
    warn!("built without MongoDB support; using in-memory storage");
    AppState::with_store(config, Arc::new(MemoryCompetitionStore::new()))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
