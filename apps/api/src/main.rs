mod capabilities;
mod config;
mod dispatch;
mod errors;
mod extract;
mod interview;
mod llm_client;
mod pipeline;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::capabilities::build_registry;
use crate::capabilities::job_match::MarkerScoreExtractor;
use crate::config::Config;
use crate::interview::engine::InterviewEngine;
use crate::llm_client::{Generate, GenerationClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::memory::InMemoryRecordStore;
use crate::store::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (errors on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hireflow API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the generation client (wire style fixed here, never probed)
    let client = GenerationClient::new(config.llm_api_key.clone(), config.llm_client_style);
    info!(
        "generation client initialized (model: {}, style: {:?})",
        llm_client::MODEL,
        client.style()
    );
    let llm: Arc<dyn Generate> = Arc::new(client);

    // Initialize the CV summary record store
    let records: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());

    // Interview engine owns the session store
    let engine = Arc::new(InterviewEngine::new(Arc::clone(&llm), Arc::clone(&records)));

    // Assemble the capability registry (first-match routing — order matters)
    let registry = Arc::new(build_registry(
        Arc::clone(&llm),
        Arc::clone(&engine),
        &config.download_dir,
    ));
    info!("capability registry assembled");

    // Build app state
    let state = AppState {
        registry,
        records,
        engine,
        score_extractor: Arc::new(MarkerScoreExtractor),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
