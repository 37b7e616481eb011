//! Users API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::errors::{conflict_on_unique, AppError};
use crate::matching::profile::RawPreferences;
use crate::models::user::UserRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub preferences: Option<RawPreferences>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub preferences: Option<RawPreferences>,
}

fn validate_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::Validation(format!("'{email}' is not a valid email"))),
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

/// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUser>,
) -> Result<(StatusCode, Json<UserRow>), AppError> {
    let name = validate_name(&req.name)?;
    let email = validate_email(&req.email)?;
    let preferences = req
        .preferences
        .map(RawPreferences::parse)
        .transpose()?
        .unwrap_or_default();

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (name, email, preferences)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(SqlJson(preferences))
    .fetch_one(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "A user with this email already exists"))?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users
pub async fn handle_list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserRow>>, AppError> {
    let users = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at, id")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(users))
}

/// GET /api/v1/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserRow>, AppError> {
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    Ok(Json(user))
}

/// PUT|PATCH /api/v1/users/:id
///
/// Only supplied fields change. `preferences` is replaced as a whole.
pub async fn handle_update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUser>,
) -> Result<Json<UserRow>, AppError> {
    if req.name.is_none() && req.email.is_none() && req.preferences.is_none() {
        return Err(AppError::Validation("No fields provided for update".to_string()));
    }
    let name = req.name.as_deref().map(validate_name).transpose()?;
    let email = req.email.as_deref().map(validate_email).transpose()?;
    let preferences = req.preferences.map(RawPreferences::parse).transpose()?;

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET name = COALESCE($2, name),
            email = COALESCE($3, email),
            preferences = COALESCE($4, preferences),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(preferences.map(SqlJson))
    .fetch_optional(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "A user with this email already exists"))?
    .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    Ok(Json(user))
}

/// DELETE /api/v1/users/:id
///
/// Matches, interactions and saved searches go with the user.
pub async fn handle_delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalized_and_checked() {
        assert_eq!(validate_email(" Ada@Example.com ").unwrap(), "ada@example.com");
        assert!(validate_email("ada").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(validate_name("   ").is_err());
        assert_eq!(validate_name(" Ada ").unwrap(), "Ada");
    }

    #[test]
    fn test_create_payload_preferences_optional() {
        let req: CreateUser =
            serde_json::from_value(serde_json::json!({"name": "Ada", "email": "ada@example.com"}))
                .unwrap();
        assert!(req.preferences.is_none());
    }
}
