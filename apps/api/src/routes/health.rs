use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::matching::ModelChoice;
use crate::state::AppState;

/// GET /health
/// Service version plus which matchers are currently loaded.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobhunt-api",
        "models": {
            "lexical": state.registry.is_loaded(ModelChoice::Lexical),
            "semantic": state.registry.is_loaded(ModelChoice::Semantic),
        }
    }))
}
