//! Saved searches API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::saved_search::SavedSearchRow;
use crate::routes::ensure_exists;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSavedSearch {
    pub user_id: Uuid,
    pub search_name: String,
    #[serde(default = "empty_query")]
    pub search_query: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSavedSearch {
    pub search_name: Option<String>,
    pub search_query: Option<Value>,
    pub total_matches: Option<i32>,
    pub new_matches: Option<i32>,
}

fn empty_query() -> Value {
    Value::Object(Default::default())
}

fn validate_query(query: &Value) -> Result<(), AppError> {
    if !query.is_object() {
        return Err(AppError::Validation(
            "search_query must be a JSON object".to_string(),
        ));
    }
    Ok(())
}

impl UpdateSavedSearch {
    fn validate(&self) -> Result<(), AppError> {
        if self.search_name.is_none()
            && self.search_query.is_none()
            && self.total_matches.is_none()
            && self.new_matches.is_none()
        {
            return Err(AppError::Validation("No fields provided for update".to_string()));
        }
        if self.search_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("search_name cannot be empty".to_string()));
        }
        if let Some(query) = &self.search_query {
            validate_query(query)?;
        }
        if self.total_matches.is_some_and(|n| n < 0) || self.new_matches.is_some_and(|n| n < 0) {
            return Err(AppError::Validation("match counts cannot be negative".to_string()));
        }
        Ok(())
    }
}

/// POST /api/v1/saved-searches
pub async fn handle_create_saved_search(
    State(state): State<AppState>,
    Json(req): Json<CreateSavedSearch>,
) -> Result<(StatusCode, Json<SavedSearchRow>), AppError> {
    let name = req.search_name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("search_name cannot be empty".to_string()));
    }
    validate_query(&req.search_query)?;
    ensure_exists(&state.db, "users", "User", req.user_id).await?;

    let row = sqlx::query_as::<_, SavedSearchRow>(
        r#"
        INSERT INTO saved_searches (user_id, search_name, search_query)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(name)
    .bind(&req.search_query)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/saved-searches/user/:user_id
pub async fn handle_list_saved_searches(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<SavedSearchRow>>, AppError> {
    ensure_exists(&state.db, "users", "User", user_id).await?;
    let rows = sqlx::query_as::<_, SavedSearchRow>(
        "SELECT * FROM saved_searches WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// PATCH /api/v1/saved-searches/:id
pub async fn handle_update_saved_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSavedSearch>,
) -> Result<Json<SavedSearchRow>, AppError> {
    req.validate()?;

    let row = sqlx::query_as::<_, SavedSearchRow>(
        r#"
        UPDATE saved_searches
        SET search_name = COALESCE($2, search_name),
            search_query = COALESCE($3, search_query),
            total_matches = COALESCE($4, total_matches),
            new_matches = COALESCE($5, new_matches),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.search_name.map(|n| n.trim().to_string()))
    .bind(req.search_query)
    .bind(req.total_matches)
    .bind(req.new_matches)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Saved search {id} not found")))?;

    Ok(Json(row))
}

/// DELETE /api/v1/saved-searches/:id
pub async fn handle_delete_saved_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM saved_searches WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Saved search {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_defaults_to_empty_object() {
        let req: CreateSavedSearch = serde_json::from_value(json!({
            "user_id": Uuid::nil(),
            "search_name": "Remote Rust"
        }))
        .unwrap();
        assert_eq!(req.search_query, json!({}));
    }

    #[test]
    fn test_non_object_query_rejected() {
        assert!(validate_query(&json!(["rust"])).is_err());
        assert!(validate_query(&json!({"keywords": "rust"})).is_ok());
    }

    #[test]
    fn test_negative_counts_rejected() {
        let update = UpdateSavedSearch {
            new_matches: Some(-1),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(UpdateSavedSearch::default().validate().is_err());
    }
}
