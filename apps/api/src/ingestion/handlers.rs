//! Axum route handlers for the Ingestion API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::ingestion::sources::{source_by_name, SOURCE_NAMES};
use crate::ingestion::{run_ingestion, IngestionReport};
use crate::state::AppState;

/// POST /api/v1/ingestion/:source
///
/// Pulls the board's current feed and inserts postings not seen before.
/// Retrain afterwards to make them matchable.
pub async fn handle_ingest(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> Result<Json<IngestionReport>, AppError> {
    let source = source_by_name(&source)?;
    let report = run_ingestion(&state.db, &state.http, source.as_ref()).await?;
    Ok(Json(report))
}

/// GET /api/v1/ingestion/sources
pub async fn handle_list_sources() -> Json<Value> {
    Json(json!({ "sources": SOURCE_NAMES }))
}
