use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Viewed,
    Saved,
    Applied,
    Dismissed,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Viewed => "viewed",
            InteractionType::Saved => "saved",
            InteractionType::Applied => "applied",
            InteractionType::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InteractionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub interaction_type: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
