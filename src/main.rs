use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use client_profiler::transport::RedisTransport;
use client_profiler::{Profiler, ProfilerConfig, Registry, SessionContext};

mod handlers;
mod server;
mod simulation;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Sample registry plus outbound transport.
    pub profiler: Arc<Profiler>,

    pub config: ProfilerConfig,

    /// Checked by every simulated call site on each iteration.
    pub sim_running: Arc<AtomicBool>,

    /// Handle to the running simulation so `stop` can await it.
    pub sim_handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ProfilerConfig::load().context("loading profiler config")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // ── 1. Connect the transport ─────────────────────────────────
    tracing::info!(url = %config.redis_url, key = %config.redis_list_key, "connecting to redis");
    let transport = RedisTransport::connect(
        &config.redis_url,
        config.redis_list_key.clone(),
        config.redis_list_cap,
    )
    .await
    .with_context(|| format!("cannot reach redis at {}", config.redis_url))?;

    // ── 2. Build the session's profiler ──────────────────────────
    let session = SessionContext::new();
    tracing::info!(client_id = session.session_id(), window = ?config.window, "session started");
    let profiler = Profiler::new(
        Registry::with_default_aggregators(session),
        Box::new(transport),
    )
    .with_window(config.window);

    let addr = config.listen_addr.clone();
    let state = Arc::new(AppState {
        profiler: Arc::new(profiler),
        config,
        sim_running: Arc::new(AtomicBool::new(false)),
        sim_handle: tokio::sync::Mutex::new(None),
    });

    // ── 3. Serve ─────────────────────────────────────────────────
    let app = server::create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "listening; profile at /api/profile, SSE at /api/profile/stream");

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
