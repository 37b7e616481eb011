use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobMatchRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub score: f64,
    pub missing_skills: Vec<String>,
    pub match_date: DateTime<Utc>,
}
