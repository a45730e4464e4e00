use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::controllers::{health, tts::TtsController};
use crate::infrastructure::config::Config;
use crate::infrastructure::middleware::request_id_middleware;
use crate::infrastructure::repositories::TtsRepository;

pub mod cors;
pub mod extract;
pub mod shutdown;

pub use cors::cors_layer;
pub use extract::AppJson;
pub use shutdown::shutdown_signal;

/// Build the application router with all routes and layers configured
pub fn create_router(
    config: &Config,
    tts_controller: Arc<TtsController>,
    tts_repo: Arc<dyn TtsRepository>,
) -> Result<Router, Box<dyn std::error::Error>> {
    let tts_routes = Router::new()
        .route("/tts", post(TtsController::synthesize))
        .with_state(tts_controller);

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(tts_repo)
        .merge(tts_routes)
        .layer(cors_layer(&config.cors_allowed_origins)?)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Serve `app` until `shutdown` resolves, then drain in-flight requests.
///
/// Draining is bounded by `drain_timeout`; after it the server task is
/// aborted and connections still open are abandoned.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    drain_timeout: Duration,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!("Server listening on {}", listener.local_addr()?);

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            return result.map_err(io::Error::other)?;
        }
        _ = shutdown => {}
    }

    tracing::info!("Shutdown signal received, draining connections");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(drain_timeout, &mut server).await {
        Ok(result) => {
            result.map_err(io::Error::other)??;
            tracing::info!("Server stopped gracefully");
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = drain_timeout.as_secs(),
                "Shutdown timeout, abandoning open connections"
            );
            server.abort();
        }
    }

    Ok(())
}
