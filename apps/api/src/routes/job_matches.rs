//! Job matches API. Manual CRUD over stored scores; the recommender writes
//! the same table through `PgMatchStore`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{conflict_on_unique, AppError};
use crate::models::job_match::JobMatchRow;
use crate::routes::ensure_exists;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateJobMatch {
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub score: f64,
    #[serde(default)]
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateJobMatch {
    pub score: Option<f64>,
    pub missing_skills: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct MatchStats {
    pub user_id: Uuid,
    pub total_matches: i64,
    pub average_score: Option<f64>,
    pub best_score: Option<f64>,
    pub top_missing_skill: Option<String>,
}

fn validate_score(score: f64) -> Result<(), AppError> {
    if !(0.0..=1.0).contains(&score) {
        return Err(AppError::Validation(format!(
            "score must be between 0 and 1, got {score}"
        )));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/job-matches
pub async fn handle_create_match(
    State(state): State<AppState>,
    Json(req): Json<CreateJobMatch>,
) -> Result<(StatusCode, Json<JobMatchRow>), AppError> {
    validate_score(req.score)?;
    ensure_exists(&state.db, "users", "User", req.user_id).await?;
    ensure_exists(&state.db, "jobs", "Job", req.job_id).await?;

    let row = sqlx::query_as::<_, JobMatchRow>(
        r#"
        INSERT INTO job_matches (user_id, job_id, score, missing_skills)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(req.job_id)
    .bind(req.score)
    .bind(&req.missing_skills)
    .fetch_one(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "A match for this user and job already exists"))?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/job-matches/user/:user_id
///
/// Best match first.
pub async fn handle_list_user_matches(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<JobMatchRow>>, AppError> {
    ensure_exists(&state.db, "users", "User", user_id).await?;
    let rows = sqlx::query_as::<_, JobMatchRow>(
        "SELECT * FROM job_matches WHERE user_id = $1 ORDER BY score DESC, match_date DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/v1/job-matches/user/:user_id/stats
pub async fn handle_user_match_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MatchStats>, AppError> {
    ensure_exists(&state.db, "users", "User", user_id).await?;

    let (total_matches, average_score, best_score): (i64, Option<f64>, Option<f64>) =
        sqlx::query_as(
            "SELECT COUNT(*), AVG(score), MAX(score) FROM job_matches WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&state.db)
        .await?;

    let top_missing_skill: Option<(String, i64)> = sqlx::query_as(
        r#"
        SELECT skill, COUNT(*) AS occurrences
        FROM job_matches, unnest(missing_skills) AS skill
        WHERE user_id = $1
        GROUP BY skill
        ORDER BY occurrences DESC, skill
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(MatchStats {
        user_id,
        total_matches,
        average_score,
        best_score,
        top_missing_skill: top_missing_skill.map(|(skill, _)| skill),
    }))
}

/// PATCH /api/v1/job-matches/:id
pub async fn handle_update_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateJobMatch>,
) -> Result<Json<JobMatchRow>, AppError> {
    if req.score.is_none() && req.missing_skills.is_none() {
        return Err(AppError::Validation("No fields provided for update".to_string()));
    }
    if let Some(score) = req.score {
        validate_score(score)?;
    }

    let row = sqlx::query_as::<_, JobMatchRow>(
        r#"
        UPDATE job_matches
        SET score = COALESCE($2, score),
            missing_skills = COALESCE($3, missing_skills),
            match_date = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.score)
    .bind(req.missing_skills)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job match {id} not found")))?;

    Ok(Json(row))
}

/// DELETE /api/v1/job-matches/:id
pub async fn handle_delete_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM job_matches WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Job match {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds_inclusive() {
        assert!(validate_score(0.0).is_ok());
        assert!(validate_score(1.0).is_ok());
        assert!(validate_score(1.01).is_err());
        assert!(validate_score(-0.1).is_err());
        assert!(validate_score(f64::NAN).is_err());
    }

    #[test]
    fn test_missing_skills_default_empty() {
        let req: CreateJobMatch = serde_json::from_value(serde_json::json!({
            "user_id": Uuid::nil(),
            "job_id": Uuid::nil(),
            "score": 0.4
        }))
        .unwrap();
        assert!(req.missing_skills.is_empty());
    }
}
