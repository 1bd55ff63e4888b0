//! Buzzboard binary entrypoint wiring REST, WebSocket, SSE and the session timer pump.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use buzzboard_back::{
    config::AppConfig,
    dao::board_store::{BoardStore, FileBoardStore},
    routes,
    services::game_service,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();
    match &allowed_origins {
        Some(origins) => info!(?origins, "restricting CORS to configured origins"),
        None => info!("CORS accepts any origin"),
    }

    let store = FileBoardStore::new(config.boards_dir.clone());
    if let Err(err) = store.health_check().await {
        warn!(
            boards_dir = %store.root().display(),
            error = %err,
            "board directory is not usable yet; games cannot start until it is"
        );
    }

    let (app_state, timer_events) = AppState::new(config, Arc::new(store));
    tokio::spawn(game_service::run_timer_events(
        app_state.clone(),
        timer_events,
    ));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state, allowed_origins.as_deref());

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

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState, allowed_origins: Option<&[String]>) -> Router<()> {
    routes::router(state)
        .layer(routes::cors_layer(allowed_origins))
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
