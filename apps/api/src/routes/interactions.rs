//! User-job interactions API (viewed / saved / applied / dismissed).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{conflict_on_unique, AppError};
use crate::models::interaction::{InteractionRow, InteractionType};
use crate::routes::ensure_exists;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInteraction {
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub interaction_type: InteractionType,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateInteraction {
    pub interaction_type: Option<InteractionType>,
    pub notes: Option<String>,
}

/// POST /api/v1/interactions
///
/// One row per (user, job, type); recording the same action twice is a conflict.
pub async fn handle_create_interaction(
    State(state): State<AppState>,
    Json(req): Json<CreateInteraction>,
) -> Result<(StatusCode, Json<InteractionRow>), AppError> {
    ensure_exists(&state.db, "users", "User", req.user_id).await?;
    ensure_exists(&state.db, "jobs", "Job", req.job_id).await?;

    let row = sqlx::query_as::<_, InteractionRow>(
        r#"
        INSERT INTO user_job_interactions (user_id, job_id, interaction_type, notes)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(req.job_id)
    .bind(req.interaction_type.as_str())
    .bind(req.notes)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        conflict_on_unique(
            e,
            &format!(
                "Interaction '{}' already recorded for this job",
                req.interaction_type.as_str()
            ),
        )
    })?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/interactions/user/:user_id
pub async fn handle_list_user_interactions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<InteractionRow>>, AppError> {
    ensure_exists(&state.db, "users", "User", user_id).await?;
    let rows = sqlx::query_as::<_, InteractionRow>(
        "SELECT * FROM user_job_interactions WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/v1/interactions/job/:job_id
pub async fn handle_list_job_interactions(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<InteractionRow>>, AppError> {
    ensure_exists(&state.db, "jobs", "Job", job_id).await?;
    let rows = sqlx::query_as::<_, InteractionRow>(
        "SELECT * FROM user_job_interactions WHERE job_id = $1 ORDER BY created_at DESC",
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// PATCH /api/v1/interactions/:id
pub async fn handle_update_interaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInteraction>,
) -> Result<Json<InteractionRow>, AppError> {
    if req.interaction_type.is_none() && req.notes.is_none() {
        return Err(AppError::Validation("No fields provided for update".to_string()));
    }

    let row = sqlx::query_as::<_, InteractionRow>(
        r#"
        UPDATE user_job_interactions
        SET interaction_type = COALESCE($2, interaction_type),
            notes = COALESCE($3, notes)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.interaction_type.map(|t| t.as_str()))
    .bind(req.notes)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "Interaction already recorded for this job"))?
    .ok_or_else(|| AppError::NotFound(format!("Interaction {id} not found")))?;

    Ok(Json(row))
}

/// DELETE /api/v1/interactions/:id
pub async fn handle_delete_interaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM user_job_interactions WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Interaction {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
