use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures raised by the matching core: corpus builds, artifact IO, matchers.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Cannot fit a model on an empty job corpus")]
    EmptyCorpus,

    #[error("Model artifact not found at {0}; run training first")]
    ModelNotFound(PathBuf),

    #[error("Malformed profile: {0}")]
    MalformedProfile(String),

    #[error("Incompatible artifact at {path}: {reason}")]
    IncompatibleArtifact { path: PathBuf, reason: String },

    #[error("Sentence encoder error: {0}")]
    Encoder(String),

    #[error("No sentence encoder is loaded; the semantic matcher is unavailable")]
    EncoderUnavailable,

    #[error("Matching worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Artifact IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Artifact serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Failures while pulling postings from a job board.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unknown job source '{0}'")]
    UnknownSource(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} returned status {status}")]
    Api { source_name: &'static str, status: u16 },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Matching error: {0}")]
    Matching(MatchError),

    #[error("Upstream source error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::MalformedProfile(msg) => AppError::Validation(msg),
            MatchError::ModelNotFound(_)
            | MatchError::IncompatibleArtifact { .. }
            | MatchError::EncoderUnavailable => {
                AppError::ModelUnavailable(err.to_string())
            }
            MatchError::Storage(e) => AppError::Database(e),
            other => AppError::Matching(other),
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::UnknownSource(name) => {
                AppError::NotFound(format!("Unknown job source '{name}'"))
            }
            IngestError::Storage(e) => AppError::Database(e),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::ModelUnavailable(msg) => {
                tracing::warn!("Model unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "MODEL_UNAVAILABLE",
                    "Recommendation model is not loaded; retrain required, try again later"
                        .to_string(),
                )
            }
            AppError::Matching(MatchError::EmptyCorpus) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "EMPTY_CORPUS",
                "No job postings are available to train on".to_string(),
            ),
            AppError::Matching(e) => {
                tracing::error!("Matching error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MATCHING_ERROR",
                    "Failed to generate recommendations; try again later".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream source error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "A job source could not be reached".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Maps a unique-constraint violation to `Conflict`, everything else to `Database`.
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}
