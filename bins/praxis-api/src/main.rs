mod handlers;
mod metrics;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use praxis_content::{LessonStore, ProgressStore};
use praxis_engine::{Engine, EngineConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

pub struct AppState {
    pub engine: Engine,
    pub lessons: LessonStore,
    pub progress: ProgressStore,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Praxis API booting...");

    let addr = std::env::var("PRAXIS_ADDR").unwrap_or_else(|_| "0.0.0.0:5001".to_string());
    let lessons_dir =
        std::env::var("PRAXIS_LESSONS_DIR").unwrap_or_else(|_| "data/lessons".to_string());
    let db_path =
        std::env::var("PRAXIS_DB_PATH").unwrap_or_else(|_| "data/learning.db".to_string());

    let config = EngineConfig::from_env();
    info!(
        backend = ?config.backend,
        timeout_ms = config.timeout_ms,
        max_output_chars = config.max_output_chars,
        "Execution engine configured"
    );
    let engine = Engine::new(config);

    let lessons = LessonStore::new(&lessons_dir);
    let progress = ProgressStore::connect(&db_path)
        .await
        .with_context(|| format!("failed to open progress database at {db_path}"))?;

    info!(lessons_dir = %lessons_dir, db_path = %db_path, "Content stores ready");

    let state = Arc::new(AppState {
        engine,
        lessons,
        progress,
    });

    let app = routes::routes().with_state(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("HTTP server listening on {}", addr);
    info!("Ready to accept submissions");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "Failed to install CTRL+C handler");
        return;
    }
    warn!("Received shutdown signal, stopping...");
}
