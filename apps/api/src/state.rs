use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::matching::registry::MatcherRegistry;
use crate::matching::service::RecommendationService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Live lexical/semantic matchers; swapped in place by retraining.
    pub registry: Arc<MatcherRegistry>,
    pub recommender: Arc<RecommendationService>,
    /// Shared HTTP client for job-board ingestion.
    pub http: reqwest::Client,
}
