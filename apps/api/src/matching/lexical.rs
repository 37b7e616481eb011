//! Lexical Matcher: TF-IDF cosine ranking with a missing-keyword report.

use std::path::Path;
use std::sync::Arc;

use crate::errors::MatchError;
use crate::matching::artifact::{load_artifact, LexicalArtifact};
use crate::matching::normalizer::Normalizer;
use crate::matching::profile::UserProfile;
use crate::matching::tfidf::SparseVec;
use crate::matching::{
    round_score, top_candidates, JobMatcher, MatchResult, ModelChoice, MAX_MISSING_SKILLS,
};

/// Similarities below this are not worth showing.
pub const LEXICAL_SCORE_FLOOR: f32 = 0.05;

pub struct LexicalMatcher {
    artifact: LexicalArtifact,
    normalizer: Arc<Normalizer>,
}

impl LexicalMatcher {
    pub fn load(path: &Path, normalizer: Arc<Normalizer>) -> Result<Self, MatchError> {
        let artifact: LexicalArtifact = load_artifact(path)?;
        Self::from_artifact(artifact, normalizer).map_err(|reason| {
            MatchError::IncompatibleArtifact {
                path: path.to_path_buf(),
                reason,
            }
        })
    }

    /// Wraps an in-memory artifact, rejecting one whose matrix and corpus disagree.
    pub fn from_artifact(
        artifact: LexicalArtifact,
        normalizer: Arc<Normalizer>,
    ) -> Result<Self, String> {
        if artifact.matrix.len() != artifact.corpus.len() {
            return Err(format!(
                "{} matrix rows for {} corpus entries",
                artifact.matrix.len(),
                artifact.corpus.len()
            ));
        }
        Ok(Self {
            artifact,
            normalizer,
        })
    }

    pub fn corpus_len(&self) -> usize {
        self.artifact.corpus.len()
    }

    /// Vocabulary terms weighted in the job row but absent from the user vector,
    /// heaviest first. Equal weights keep vocabulary order.
    fn missing_terms(&self, job_row: &SparseVec, user_vec: &SparseVec) -> Vec<String> {
        let mut gaps: Vec<(u32, f32)> = job_row
            .indices
            .iter()
            .zip(&job_row.values)
            .filter(|&(&idx, &weight)| weight > 0.0 && user_vec.get(idx) == 0.0)
            .map(|(&idx, &weight)| (idx, weight))
            .collect();
        gaps.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        gaps.into_iter()
            .filter_map(|(idx, _)| self.artifact.vectorizer.feature_name(idx))
            .take(MAX_MISSING_SKILLS)
            .map(str::to_string)
            .collect()
    }
}

impl JobMatcher for LexicalMatcher {
    fn kind(&self) -> ModelChoice {
        ModelChoice::Lexical
    }

    fn recommend(
        &self,
        profile: &UserProfile,
        top_n: usize,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let lemmas = self
            .normalizer
            .normalize_for_lexical(&profile.lexical_text())
            .join(" ");
        let user_vec = self.artifact.vectorizer.transform(&lemmas);

        // Rows and the query are unit length (or empty), so the dot product is the cosine.
        let scored: Vec<(usize, f32)> = self
            .artifact
            .matrix
            .iter()
            .enumerate()
            .map(|(row, job_vec)| (row, job_vec.dot(&user_vec)))
            .collect();

        let results = top_candidates(scored, top_n)
            .into_iter()
            .filter(|&(_, similarity)| similarity >= LEXICAL_SCORE_FLOOR)
            .map(|(row, similarity)| {
                let entry = &self.artifact.corpus[row];
                MatchResult {
                    job_id: entry.job_id,
                    score: round_score(similarity),
                    missing_skills: self.missing_terms(&self.artifact.matrix[row], &user_vec),
                    title: entry.title.clone(),
                    company: entry.company.clone(),
                }
            })
            .collect();

        Ok(results)
    }
}
