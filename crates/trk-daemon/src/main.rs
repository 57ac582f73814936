//! trk-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, connects to the
//! database, seeds the carrier directory, wires middleware, and starts the
//! HTTP server. All route handlers live in `routes.rs`; shared state lives
//! in `state.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use trk_carrier::HttpTrackingClient;
use trk_daemon::{routes, state};
use trk_db::seed::{seed_carriers, ENV_CARRIER_API_KEY};
use trk_db::{PgCarrierDirectory, PgTrackingStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let pool = trk_db::connect_from_env().await?;
    trk_db::migrate(&pool).await?;

    // The upstream credential is injected, never compiled in. Do not log it.
    let api_key = std::env::var(ENV_CARRIER_API_KEY)
        .with_context(|| format!("missing env var {ENV_CARRIER_API_KEY}"))?;
    seed_carriers(&pool, &api_key).await?;
    info!("carrier directory seeded");

    let shared = Arc::new(state::AppState::new(
        Arc::new(PgCarrierDirectory::new(pool.clone())),
        Arc::new(PgTrackingStore::new(pool)),
        Arc::new(HttpTrackingClient::new()),
    ));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8899)));
    info!("trk-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("TRK_DAEMON_ADDR").ok()?.parse().ok()
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
