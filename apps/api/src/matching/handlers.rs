//! Axum route handlers for the ML API: recommendations, retraining, matcher status.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::corpus::load_corpus;
use crate::matching::profile::{RawPreferences, UserProfile};
use crate::matching::training::{train_on, TrainReport};
use crate::matching::{MatchResult, ModelChoice, MAX_TOP_N};
use crate::models::user::UserRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JobMatchRequest {
    pub user_id: Uuid,
    /// Overrides the stored preferences for this request only.
    pub preferences: Option<RawPreferences>,
    pub model: Option<ModelChoice>,
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct JobMatchResponse {
    pub status: &'static str,
    pub model_used: ModelChoice,
    pub matches: Vec<MatchResult>,
}

#[derive(Debug, Deserialize)]
pub struct TrainQuery {
    pub model: Option<ModelChoice>,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub status: &'static str,
    pub models: Vec<TrainReport>,
}

#[derive(Debug, Serialize)]
pub struct MatcherStatus {
    pub model: ModelChoice,
    pub loaded: bool,
    pub artifact_path: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub default_model: ModelChoice,
    pub models: Vec<MatcherStatus>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/ml/job-matches
///
/// Ranks jobs for a user and upserts the results into `job_matches`.
/// An empty `matches` list is a successful "nothing relevant" answer.
pub async fn handle_job_matches(
    State(state): State<AppState>,
    Json(request): Json<JobMatchRequest>,
) -> Result<Json<JobMatchResponse>, AppError> {
    let model = request.model.unwrap_or(state.config.default_matcher);
    let top_n = resolve_top_n(request.top_n, state.config.recommendation_top_n, model)?;

    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(request.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.user_id)))?;

    let preferences = match request.preferences {
        Some(raw) => raw.parse()?,
        None => user.preferences.0,
    };
    let profile = UserProfile::from(&preferences);

    let matches = state
        .recommender
        .generate_and_store(user.id, profile, model, top_n)
        .await?;

    Ok(Json(JobMatchResponse {
        status: "success",
        model_used: model,
        matches,
    }))
}

/// Request value, else the configured override, else the matcher's own default.
fn resolve_top_n(
    requested: Option<usize>,
    configured: Option<usize>,
    model: ModelChoice,
) -> Result<usize, AppError> {
    let top_n = requested
        .or(configured)
        .unwrap_or_else(|| model.default_top_n());
    if top_n == 0 || top_n > MAX_TOP_N {
        return Err(AppError::Validation(format!(
            "top_n must be between 1 and {MAX_TOP_N}"
        )));
    }
    Ok(top_n)
}

/// POST /api/v1/ml/train?model=lexical|semantic
///
/// Rebuilds the requested matcher (or every matcher this process can serve)
/// from the full job table and swaps it in. The corpus is scanned once.
pub async fn handle_train(
    State(state): State<AppState>,
    Query(query): Query<TrainQuery>,
) -> Result<Json<TrainResponse>, AppError> {
    let kinds = match query.model {
        Some(kind) => vec![kind],
        None => state.registry.buildable(),
    };

    let jobs = load_corpus(&state.db).await?;
    let mut models = Vec::with_capacity(kinds.len());
    for kind in kinds {
        models.push(train_on(jobs.clone(), &state.registry, kind).await?);
    }

    Ok(Json(TrainResponse {
        status: "success",
        models,
    }))
}

/// GET /api/v1/ml/status
pub async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let models = ModelChoice::ALL
        .into_iter()
        .map(|kind| MatcherStatus {
            model: kind,
            loaded: state.registry.is_loaded(kind),
            artifact_path: state.registry.artifact_path(kind).display().to_string(),
        })
        .collect();

    Json(StatusResponse {
        default_model: state.config.default_matcher,
        models,
    })
}
