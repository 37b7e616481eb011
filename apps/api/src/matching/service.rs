//! Recommendation Service: dispatches to the chosen matcher and persists its output.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::MatchError;
use crate::matching::profile::UserProfile;
use crate::matching::registry::MatcherRegistry;
use crate::matching::{MatchResult, ModelChoice};

/// Persistence seam for match records, keyed by `(user_id, job_id)`.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Inserts each match or, when the pair already exists, overwrites its
    /// score, missing skills and match date. Matches whose job no longer exists
    /// are skipped; returns the job ids that were written.
    async fn upsert_matches(
        &self,
        user_id: Uuid,
        matches: &[MatchResult],
    ) -> Result<HashSet<Uuid>, MatchError>;
}

pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn upsert_matches(
        &self,
        user_id: Uuid,
        matches: &[MatchResult],
    ) -> Result<HashSet<Uuid>, MatchError> {
        let mut stored = HashSet::with_capacity(matches.len());
        if matches.is_empty() {
            return Ok(stored);
        }
        let mut tx = self.pool.begin().await?;
        for m in matches {
            let result = sqlx::query(
                r#"
                INSERT INTO job_matches (user_id, job_id, score, missing_skills, match_date)
                SELECT $1::uuid, $2::uuid, $3::float8, $4::text[], NOW()
                WHERE EXISTS (SELECT 1 FROM jobs WHERE id = $2::uuid)
                ON CONFLICT (user_id, job_id) DO UPDATE
                SET score = EXCLUDED.score,
                    missing_skills = EXCLUDED.missing_skills,
                    match_date = EXCLUDED.match_date
                "#,
            )
            .bind(user_id)
            .bind(m.job_id)
            .bind(m.score)
            .bind(&m.missing_skills)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() > 0 {
                stored.insert(m.job_id);
            }
        }
        tx.commit().await?;
        Ok(stored)
    }
}

pub struct RecommendationService {
    registry: Arc<MatcherRegistry>,
    store: Arc<dyn MatchStore>,
}

impl RecommendationService {
    pub fn new(registry: Arc<MatcherRegistry>, store: Arc<dyn MatchStore>) -> Self {
        Self { registry, store }
    }

    /// Ranks jobs for `profile` with the chosen matcher and upserts every result for `user_id`.
    ///
    /// Scoring runs on the blocking pool; the upsert is the only side effect.
    pub async fn generate_and_store(
        &self,
        user_id: Uuid,
        profile: UserProfile,
        model: ModelChoice,
        top_n: usize,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let matcher = self.registry.get(model)?;
        let mut matches =
            tokio::task::spawn_blocking(move || matcher.recommend(&profile, top_n)).await??;

        let stored = self.store.upsert_matches(user_id, &matches).await?;
        if stored.len() < matches.len() {
            warn!(
                model = %model,
                skipped = matches.len() - stored.len(),
                "Dropped matches for deleted jobs; the artifact is stale until retrained"
            );
            matches.retain(|m| stored.contains(&m.job_id));
        }

        info!(
            user_id = %user_id,
            model = %model,
            matches = matches.len(),
            "Stored job matches"
        );
        Ok(matches)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// `(user_id, job_id)` → (score, missing_skills, write count).
    /// With `known_jobs` set, matches for other job ids are skipped like a deleted row.
    #[derive(Default)]
    pub struct InMemoryMatchStore {
        pub rows: Mutex<HashMap<(Uuid, Uuid), (f64, Vec<String>, usize)>>,
        pub known_jobs: Option<HashSet<Uuid>>,
    }

    impl InMemoryMatchStore {
        pub fn with_known_jobs(ids: impl IntoIterator<Item = Uuid>) -> Self {
            Self {
                known_jobs: Some(ids.into_iter().collect()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl MatchStore for InMemoryMatchStore {
        async fn upsert_matches(
            &self,
            user_id: Uuid,
            matches: &[MatchResult],
        ) -> Result<HashSet<Uuid>, MatchError> {
            let mut rows = self.rows.lock().unwrap();
            let mut stored = HashSet::new();
            for m in matches {
                if self
                    .known_jobs
                    .as_ref()
                    .is_some_and(|known| !known.contains(&m.job_id))
                {
                    continue;
                }
                stored.insert(m.job_id);
                let entry = rows
                    .entry((user_id, m.job_id))
                    .or_insert((0.0, Vec::new(), 0));
                entry.0 = m.score;
                entry.1 = m.missing_skills.clone();
                entry.2 += 1;
            }
            Ok(stored)
        }
    }
}
