//! Jobs API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::errors::{conflict_on_unique, AppError};
use crate::models::job::{JobRow, NewJob, SalaryRange};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub source: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub skills_required: Option<Vec<String>>,
    pub salary_range: Option<SalaryRange>,
    pub source_url: Option<String>,
}

impl JobUpdate {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.company.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.skills_required.is_none()
            && self.salary_range.is_none()
            && self.source_url.is_none()
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.is_empty() {
            return Err(AppError::Validation("No fields provided for update".to_string()));
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        if let Some(range) = &self.salary_range {
            range.validate().map_err(AppError::Validation)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct KeywordsResponse {
    pub job_id: Uuid,
    pub keywords: Vec<String>,
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(job): Json<NewJob>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    job.validate().map_err(AppError::Validation)?;

    let row = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs
            (external_id, title, company, location, description,
             skills_required, salary_range, source, source_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(job.external_id.trim())
    .bind(job.title.trim())
    .bind(&job.company)
    .bind(&job.location)
    .bind(&job.description)
    .bind(&job.skills_required)
    .bind(job.salary_range.map(SqlJson))
    .bind(&job.source)
    .bind(&job.source_url)
    .fetch_one(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "Job with this external_id already exists"))?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/jobs?source=&limit=&offset=
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let jobs = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT * FROM jobs
        WHERE ($1::TEXT IS NULL OR source = $1)
        ORDER BY ingested_at DESC, id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(query.source)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(jobs))
}

async fn fetch_job(state: &AppState, id: Uuid) -> Result<JobRow, AppError> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(fetch_job(&state, id).await?))
}

/// GET /api/v1/jobs/:id/keywords
///
/// The de-duplicated lexical vocabulary of the job's description.
pub async fn handle_job_keywords(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<KeywordsResponse>, AppError> {
    let job = fetch_job(&state, id).await?;
    let keywords = state
        .registry
        .normalizer()
        .vocabulary(&job.description)
        .into_iter()
        .collect();
    Ok(Json(KeywordsResponse {
        job_id: id,
        keywords,
    }))
}

/// PUT|PATCH /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<JobUpdate>,
) -> Result<Json<JobRow>, AppError> {
    update.validate()?;

    let row = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs
        SET title = COALESCE($2, title),
            company = COALESCE($3, company),
            location = COALESCE($4, location),
            description = COALESCE($5, description),
            skills_required = COALESCE($6, skills_required),
            salary_range = COALESCE($7, salary_range),
            source_url = COALESCE($8, source_url)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(update.title.map(|t| t.trim().to_string()))
    .bind(update.company)
    .bind(update.location)
    .bind(update.description)
    .bind(update.skills_required)
    .bind(update.salary_range.map(SqlJson))
    .bind(update.source_url)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    Ok(Json(row))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_rejected() {
        let err = JobUpdate::default().validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_update_with_inverted_salary_rejected() {
        let update: JobUpdate = serde_json::from_value(serde_json::json!({
            "salary_range": {"min": 150000, "max": 80000}
        }))
        .unwrap();
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_single_field_accepted() {
        let update: JobUpdate =
            serde_json::from_value(serde_json::json!({"description": "Rust and Tokio"})).unwrap();
        assert!(update.validate().is_ok());
    }
}
