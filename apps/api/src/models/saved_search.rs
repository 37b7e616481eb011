use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedSearchRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub search_name: String,
    pub search_query: Value,
    pub total_matches: i32,
    pub new_matches: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
