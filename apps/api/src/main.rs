mod config;
mod db;
mod errors;
mod ingestion;
mod matching;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::matching::encoder::SentenceEncoder;
use crate::matching::normalizer::Normalizer;
use crate::matching::registry::MatcherRegistry;
use crate::matching::service::{PgMatchStore, RecommendationService};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let mut config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobHunt API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize HTTP client for job-board feeds
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("jobhunt-api/", env!("CARGO_PKG_VERSION")))
        .build()?;

    // Initialize matchers; missing artifacts are logged and served as 503 until trained
    let encoder = load_encoder(&config);
    config.fit_to_encoder(encoder.is_some());
    let registry = Arc::new(MatcherRegistry::new(
        Arc::new(Normalizer::new()),
        encoder,
        config.lexical_model_path.clone(),
        config.semantic_model_path.clone(),
    ));
    registry.load_all();

    let recommender = Arc::new(RecommendationService::new(
        registry.clone(),
        Arc::new(PgMatchStore::new(db.clone())),
    ));

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        registry,
        recommender,
        http,
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

/// The sentence encoder, when built with `onnx` and the model directory loads.
#[cfg(feature = "onnx")]
fn load_encoder(config: &Config) -> Option<Arc<dyn SentenceEncoder>> {
    match matching::encoder::OnnxEncoder::load(&config.embedding_model_dir) {
        Ok(encoder) => {
            info!(
                "Sentence encoder loaded (model: {}, dim: {})",
                encoder.model_id(),
                encoder.dim()
            );
            Some(Arc::new(encoder))
        }
        Err(e) => {
            tracing::warn!(
                dir = %config.embedding_model_dir.display(),
                "Sentence encoder unavailable, semantic matching disabled: {e:#}"
            );
            None
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn load_encoder(_config: &Config) -> Option<Arc<dyn SentenceEncoder>> {
    info!("Built without `onnx`; semantic matching disabled");
    None
}
